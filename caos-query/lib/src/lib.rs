//! Query definition code generator.
//!
//! Reads a YAML file describing query methods and produces the C++ headers
//! and CMake fragment that wire those queries into the `IQuery` interface,
//! its `Cache` and `Database` forwarders, and the authentication table.
//!
//! ## Pipeline
//!
//! ```text
//! load -> validate -> normalize -> filter -> render -> write
//! ```
//!
//! - [`loader`] - YAML parsing (exactly one document per file)
//! - [`schema`] - JSON-Schema validation of the loaded document
//! - [`normalize`] - projection into [`QueryDefinition`] records
//! - [`policy`] - category based enablement
//! - [`emit`] - the six artifact renderers
//! - [`output`] - all-or-nothing writes into the output directory
//!
//! ## Example Usage
//!
//! ```no_run
//! use caos_query_lib::{FeatureFlags, GeneratorConfig, generate};
//!
//! let config = GeneratorConfig::new("queries.yaml", "build/generated")
//!     .features(FeatureFlags::new().example(true));
//!
//! let report = generate(&config)?;
//! println!("{} of {} queries enabled", report.enabled, report.total);
//! # Ok::<(), caos_query_lib::QueryGenError>(())
//! ```

pub mod config;
pub mod definition;
pub mod emit;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod policy;
pub mod schema;

use std::path::PathBuf;

use tracing::{debug, info};

pub use config::{FeatureFlags, GeneratorConfig, SchemaPolicy};
pub use definition::{
    AuthType, Authentication, Category, KeyBehavior, Parameter, QueryDefinition,
};
pub use emit::{Artifact, RenderedArtifact};
pub use error::{DefinitionError, DefinitionErrorKind, EntryLocation, QueryGenError, Result};
pub use schema::{SchemaValidator, SchemaViolation};

/// Outcome of one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Entries found in the definitions file.
    pub total: usize,
    /// Entries that passed the enablement policy.
    pub enabled: usize,
    /// Enabled entries whose key is provisioned automatically.
    pub auto_tokens: usize,
    /// All six artifacts, in [`Artifact::ALL`] order.
    pub artifacts: Vec<RenderedArtifact>,
    /// Paths written to disk; empty for a dry run.
    pub written: Vec<PathBuf>,
}

/// Loads, validates and normalizes the definitions file named by `config`.
///
/// ## Errors
///
/// Any loader, schema or definition error, depending on
/// [`GeneratorConfig::schema_policy`].
pub fn load_definitions(config: &GeneratorConfig) -> Result<Vec<QueryDefinition>> {
    let validator = schema::resolve_validator(config.schema_policy, config.schema_path.as_deref())?;

    info!("Loading query definitions from {}", config.definitions.display());
    let document = loader::load_file(&config.definitions)?;

    if let Some(validator) = &validator {
        validator.validate_value(&document, &config.definitions.display().to_string())?;
        debug!("Schema validation passed ({})", validator.origin());
    }

    Ok(normalize::normalize_document(&document)?)
}

/// Runs the pipeline up to rendering, without touching the output directory.
pub fn render(config: &GeneratorConfig) -> Result<GenerationReport> {
    let definitions = load_definitions(config)?;
    let enabled = policy::filter_enabled(&definitions, &config.features)?;
    let auto_tokens = enabled.iter().filter(|def| def.is_auto_token()).count();

    info!("Total queries found: {}", definitions.len());
    info!("Enabled queries: {}", enabled.len());
    info!("Auto token queries: {auto_tokens}");

    Ok(GenerationReport {
        total: definitions.len(),
        enabled: enabled.len(),
        auto_tokens,
        artifacts: emit::render_all(&enabled),
        written: Vec::new(),
    })
}

/// Runs the whole pipeline and writes the six artifacts.
///
/// Nothing is written when [`GeneratorConfig::dry_run`] is set, or when any
/// step before the write fails.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport> {
    let mut report = render(config)?;

    if config.dry_run {
        info!("Dry run: skipping writes to {}", config.output_dir.display());
        return Ok(report);
    }

    info!("Writing output to {}", config.output_dir.display());
    report.written = output::write_artifacts(&config.output_dir, &report.artifacts)?;
    Ok(report)
}
