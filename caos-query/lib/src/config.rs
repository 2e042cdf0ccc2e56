//! Generator configuration.
//!
//! A [`GeneratorConfig`] is built once by the caller and passed down the
//! pipeline; nothing in the library reads process-wide settings.
//!
//! ## Examples
//!
//! ```
//! use caos_query_lib::{FeatureFlags, GeneratorConfig, SchemaPolicy};
//!
//! let config = GeneratorConfig::new("queries.yaml", "build/generated")
//!     .features(FeatureFlags::new().example(true))
//!     .schema_policy(SchemaPolicy::Disabled);
//!
//! assert!(config.features.example);
//! assert!(!config.features.template);
//! ```

use std::path::PathBuf;

/// How schema validation is applied before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPolicy {
    /// Skip schema validation entirely.
    Disabled,
    /// Validate when the schema can be loaded; otherwise warn and continue.
    #[default]
    BestEffort,
    /// Validate, and fail if the schema cannot be loaded.
    Required,
}

/// Flags that permit inclusion of non-standard query categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Include `example`-category queries.
    pub example: bool,
    /// Include `template`-category queries.
    pub template: bool,
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn example(mut self, enabled: bool) -> Self {
        self.example = enabled;
        self
    }

    pub fn template(mut self, enabled: bool) -> Self {
        self.template = enabled;
        self
    }
}

/// Everything one generator run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path to the YAML definitions file.
    pub definitions: PathBuf,
    /// Directory the six artifacts are written into (created if absent).
    pub output_dir: PathBuf,
    /// Schema override; the embedded schema is used when `None`.
    pub schema_path: Option<PathBuf>,
    pub schema_policy: SchemaPolicy,
    pub features: FeatureFlags,
    /// Render without writing anything to disk.
    pub dry_run: bool,
}

impl GeneratorConfig {
    pub fn new(definitions: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            definitions: definitions.into(),
            output_dir: output_dir.into(),
            schema_path: None,
            schema_policy: SchemaPolicy::default(),
            features: FeatureFlags::default(),
            dry_run: false,
        }
    }

    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_best_effort_with_no_flags() {
        let config = GeneratorConfig::new("q.yaml", "out");

        assert_eq!(config.schema_policy, SchemaPolicy::BestEffort);
        assert_eq!(config.features, FeatureFlags::default());
        assert_eq!(config.schema_path, None);
        assert!(!config.dry_run);
    }

    #[test]
    fn builder_sets_every_field() {
        let config = GeneratorConfig::new("q.yaml", "out")
            .schema_path("schema.json")
            .schema_policy(SchemaPolicy::Required)
            .features(FeatureFlags::new().example(true).template(true))
            .dry_run(true);

        assert_eq!(config.schema_path, Some(PathBuf::from("schema.json")));
        assert_eq!(config.schema_policy, SchemaPolicy::Required);
        assert!(config.features.example && config.features.template);
        assert!(config.dry_run);
    }
}
