//! Enablement policy: which definitions reach the emitters.
//!
//! | `enabled` | category   | flag for category | result                |
//! |-----------|------------|-------------------|-----------------------|
//! | false     | example    | set               | error (contradiction) |
//! | false     | template   | set               | error (contradiction) |
//! | false     | any        | -                 | excluded              |
//! | true      | standard   | -                 | included              |
//! | true      | example    | set / unset       | included / excluded   |
//! | true      | template   | set / unset       | included / excluded   |

use tracing::info;

use crate::config::FeatureFlags;
use crate::definition::{Category, QueryDefinition};
use crate::error::{DefinitionError, DefinitionErrorKind};

/// Command-line spelling of the example flag, used in messages.
pub const EXAMPLE_FLAG: &str = "--caos-example-query";

/// Command-line spelling of the template flag, used in messages.
pub const TEMPLATE_FLAG: &str = "--caos-template-query";

/// Outcome of evaluating one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub included: bool,
    pub reason: String,
}

impl Decision {
    fn include(reason: impl Into<String>) -> Self {
        Self {
            included: true,
            reason: reason.into(),
        }
    }

    fn exclude(reason: impl Into<String>) -> Self {
        Self {
            included: false,
            reason: reason.into(),
        }
    }
}

/// Decides whether `definition` is emitted under `flags`.
///
/// ## Errors
///
/// Returns [`DefinitionErrorKind::DisabledButFlagged`] when the definition is
/// disabled but the flag enabling its category is set.
pub fn evaluate(
    definition: &QueryDefinition,
    flags: &FeatureFlags,
) -> Result<Decision, DefinitionErrorKind> {
    if !definition.enabled {
        return match definition.category {
            Category::Example if flags.example => {
                Err(DefinitionErrorKind::DisabledButFlagged { flag: EXAMPLE_FLAG })
            }
            Category::Template if flags.template => {
                Err(DefinitionErrorKind::DisabledButFlagged {
                    flag: TEMPLATE_FLAG,
                })
            }
            _ => Ok(Decision::exclude("query disabled")),
        };
    }

    Ok(match definition.category {
        Category::Standard => Decision::include("standard query always enabled"),
        Category::Example if flags.example => Decision::include("example query enabled via flag"),
        Category::Example => Decision::exclude(format!("example query requires {EXAMPLE_FLAG}")),
        Category::Template if flags.template => {
            Decision::include("template query enabled via flag")
        }
        Category::Template => Decision::exclude(format!("template query requires {TEMPLATE_FLAG}")),
    })
}

/// Returns the definitions that pass [`evaluate`], in input order.
///
/// Every decision is logged. The first contradiction aborts the filter with
/// a [`DefinitionError`] pointing at the offending entry.
pub fn filter_enabled(
    definitions: &[QueryDefinition],
    flags: &FeatureFlags,
) -> Result<Vec<QueryDefinition>, DefinitionError> {
    let mut enabled = Vec::new();

    for (index, definition) in definitions.iter().enumerate() {
        let decision = evaluate(definition, flags)
            .map_err(|kind| DefinitionError::at_entry(index, Some(&definition.name), kind))?;

        if decision.included {
            info!("Enabling {} ({})", definition.name, decision.reason);
            enabled.push(definition.clone());
        } else {
            info!("Skipping {} ({})", definition.name, decision.reason);
        }
    }

    Ok(enabled)
}
