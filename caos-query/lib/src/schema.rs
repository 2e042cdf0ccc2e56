//! JSON Schema validation of definitions documents.
//!
//! The schema is an external contract: this module only compiles it and
//! reports where a document breaks it. Files, in-memory YAML strings and
//! already-loaded values all go through [`SchemaValidator::validate_value`];
//! only the loading step differs per source.
//!
//! ## Examples
//!
//! ```
//! use caos_query_lib::schema::SchemaValidator;
//!
//! let validator = SchemaValidator::embedded().unwrap();
//! assert!(validator.validate_str("queries: []", "inline").is_ok());
//! assert!(validator.validate_str("queries: 7", "inline").is_err());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SchemaPolicy;
use crate::error::{QueryGenError, Result};
use crate::loader;

/// The schema bundled with the generator.
pub const DEFAULT_SCHEMA: &str = include_str!("../schemas/query-schema.json");

/// Maximum length of the offending-value preview in a [`SchemaViolation`].
const VALUE_PREVIEW_LIMIT: usize = 100;

/// One schema constraint broken by a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Human-readable description of the failed constraint.
    pub message: String,
    /// Keys and indices leading to the offending value.
    pub instance_path: Vec<String>,
    /// Keys leading to the violated rule inside the schema.
    pub schema_path: Vec<String>,
    /// JSON rendering of the offending value, truncated with `...`.
    pub value: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)?;
        if !self.instance_path.is_empty() {
            write!(f, "\nPath: {}", self.instance_path.join(" -> "))?;
        }
        if !self.schema_path.is_empty() {
            write!(f, "\nSchema constraint: {}", self.schema_path.join(" -> "))?;
        }
        write!(f, "\nInvalid value: {}", self.value)
    }
}

/// Where a compiled schema came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for SchemaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaOrigin::Embedded => write!(f, "<embedded query-schema.json>"),
            SchemaOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A compiled schema ready to validate definitions documents.
pub struct SchemaValidator {
    origin: SchemaOrigin,
    validator: jsonschema::Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compiles the bundled schema.
    pub fn embedded() -> Result<Self> {
        let schema: Value =
            serde_json::from_str(DEFAULT_SCHEMA).map_err(|e| QueryGenError::SchemaUnavailable {
                path: PathBuf::from(SchemaOrigin::Embedded.to_string()),
                reason: format!("invalid JSON in schema: {e}"),
            })?;
        Self::from_value(&schema, SchemaOrigin::Embedded)
    }

    /// Reads and compiles the schema at `path`.
    ///
    /// Every failure (missing file, invalid JSON, invalid schema) is reported
    /// as [`QueryGenError::SchemaUnavailable`]; the caller's [`SchemaPolicy`]
    /// decides whether that is fatal.
    pub fn from_path(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| QueryGenError::SchemaUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(unavailable("schema file not found".to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let schema: Value = serde_json::from_str(&content)
            .map_err(|e| unavailable(format!("invalid JSON in schema file: {e}")))?;

        debug!("Loaded JSON schema from {}", path.display());
        Self::from_value(&schema, SchemaOrigin::File(path.to_path_buf()))
    }

    /// Compiles an already-parsed schema document.
    pub fn from_value(schema: &Value, origin: SchemaOrigin) -> Result<Self> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| QueryGenError::SchemaUnavailable {
                path: PathBuf::from(origin.to_string()),
                reason: format!("schema error: {e}"),
            })?;
        Ok(Self { origin, validator })
    }

    pub fn origin(&self) -> &SchemaOrigin {
        &self.origin
    }

    /// Returns every violation of the schema by `data`, in engine order.
    pub fn violations(&self, data: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(data)
            .map(|error| SchemaViolation {
                message: error.to_string(),
                instance_path: pointer_segments(&error.instance_path.to_string()),
                schema_path: pointer_segments(&error.schema_path.to_string()),
                value: truncate_value(&error.instance),
            })
            .collect()
    }

    /// Validates an already-loaded document.
    ///
    /// ## Errors
    ///
    /// Returns [`QueryGenError::SchemaViolation`] carrying every violation.
    pub fn validate_value(&self, data: &Value, source_name: &str) -> Result<()> {
        let violations = self.violations(data);
        if violations.is_empty() {
            debug!("Schema validation passed for {source_name}");
            Ok(())
        } else {
            Err(QueryGenError::SchemaViolation {
                source_name: source_name.to_string(),
                violations,
            })
        }
    }

    /// Loads a YAML string and validates it.
    pub fn validate_str(&self, content: &str, source_name: &str) -> Result<()> {
        let data = loader::load_str(content, source_name)?;
        self.validate_value(&data, source_name)
    }

    /// Loads a YAML file and validates it.
    pub fn validate_file(&self, path: &Path) -> Result<()> {
        let data = loader::load_file(path)?;
        self.validate_value(&data, &path.display().to_string())
    }

    /// Validates several files without stopping at the first failure.
    ///
    /// Each entry pairs a path with the name used when reporting it.
    pub fn validate_batch(&self, files: &[(PathBuf, String)]) -> BatchReport {
        let mut failures = Vec::new();
        for (index, (path, source_name)) in files.iter().enumerate() {
            if let Err(error) = self.validate_file(path) {
                failures.push(BatchFailure {
                    index,
                    path: path.clone(),
                    source_name: source_name.clone(),
                    error,
                });
            }
        }
        BatchReport {
            checked: files.len(),
            failures,
        }
    }
}

/// Outcome of [`SchemaValidator::validate_batch`].
#[derive(Debug)]
pub struct BatchReport {
    pub checked: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn all_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure recorded for the file at `index` in the batch, if any.
    pub fn failure_at(&self, index: usize) -> Option<&BatchFailure> {
        self.failures.iter().find(|failure| failure.index == index)
    }
}

/// One file that failed in a batch run.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the file in the batch; the same path may appear twice.
    pub index: usize,
    pub path: PathBuf,
    pub source_name: String,
    pub error: QueryGenError,
}

/// Picks the validator for a run according to `policy`.
///
/// Returns `Ok(None)` when validation is disabled, or when the schema is
/// unavailable under [`SchemaPolicy::BestEffort`].
pub fn resolve_validator(
    policy: SchemaPolicy,
    schema_path: Option<&Path>,
) -> Result<Option<SchemaValidator>> {
    if policy == SchemaPolicy::Disabled {
        info!("JSON schema validation disabled");
        return Ok(None);
    }

    let loaded = match schema_path {
        Some(path) => SchemaValidator::from_path(path),
        None => SchemaValidator::embedded(),
    };

    match (loaded, policy) {
        (Ok(validator), _) => Ok(Some(validator)),
        (Err(e), SchemaPolicy::BestEffort) => {
            warn!("Failed to load JSON schema, skipping validation: {e}");
            Ok(None)
        }
        (Err(e), _) => Err(e),
    }
}

/// Splits a JSON pointer (`/queries/0/name`) into its unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn truncate_value(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() > VALUE_PREVIEW_LIMIT {
        let kept: String = rendered.chars().take(VALUE_PREVIEW_LIMIT - 3).collect();
        format!("{kept}...")
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn valid_document() -> Value {
        json!({
            "queries": [{
                "name": "IQuery_GetStatus",
                "return_type": "std::string",
                "parameters": [],
            }]
        })
    }

    // === embedded schema ===

    #[test]
    fn embedded_schema_compiles() {
        let validator = SchemaValidator::embedded().unwrap();
        assert_eq!(validator.origin(), &SchemaOrigin::Embedded);
    }

    #[test]
    fn valid_document_passes() {
        let validator = SchemaValidator::embedded().unwrap();
        assert!(validator.validate_value(&valid_document(), "input").is_ok());
    }

    #[test]
    fn full_featured_entry_passes() {
        let validator = SchemaValidator::embedded().unwrap();
        let doc = json!({
            "queries": [{
                "name": "IQuery_Example_Echo",
                "return_type": "std::string",
                "parameters": [{"type": "const std::string&", "name": "message"}],
                "metadata": {"category": "example"},
                "enabled": true,
                "authentication": {"type": "token", "env_var": "API_KEY", "required": true}
            }]
        });

        assert!(validator.violations(&doc).is_empty());
    }

    // === violations ===

    #[test]
    fn missing_queries_key_is_reported() {
        let validator = SchemaValidator::embedded().unwrap();
        let violations = validator.violations(&json!({"other": 1}));

        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("queries"));
        assert!(violations[0].instance_path.is_empty());
        assert_eq!(violations[0].schema_path, vec!["required"]);
    }

    #[test]
    fn violation_paths_locate_the_offending_value() {
        let validator = SchemaValidator::embedded().unwrap();
        let doc = json!({
            "queries": [{
                "name": "IQuery_GetStatus",
                "return_type": "std::string",
                "parameters": [],
                "enabled": "yes"
            }]
        });

        let violations = validator.violations(&doc);

        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.instance_path, vec!["queries", "0", "enabled"]);
        assert_eq!(violation.schema_path.last().map(String::as_str), Some("type"));
        assert_eq!(violation.value, "\"yes\"");
    }

    #[test]
    fn every_violation_is_collected() {
        let validator = SchemaValidator::embedded().unwrap();
        let doc = json!({
            "queries": [
                {"name": "A", "return_type": "int", "parameters": [], "enabled": 1},
                {"name": "B", "return_type": 2, "parameters": []}
            ]
        });

        assert_eq!(validator.violations(&doc).len(), 2);
    }

    #[test]
    fn multi_line_types_are_reported() {
        let validator = SchemaValidator::embedded().unwrap();
        let doc = json!({
            "queries": [{
                "name": "Q",
                "return_type": "std::string\nint",
                "parameters": [{"type": "const\nint", "name": "x"}]
            }]
        });

        let mut paths: Vec<Vec<String>> = validator
            .violations(&doc)
            .into_iter()
            .map(|v| v.instance_path)
            .collect();
        paths.sort();

        assert_eq!(
            paths,
            vec![
                vec!["queries", "0", "parameters", "0", "type"],
                vec!["queries", "0", "return_type"],
            ]
        );
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(300);
        let truncated = truncate_value(&json!(long));

        assert_eq!(truncated.chars().count(), VALUE_PREVIEW_LIMIT);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn pointer_segments_unescape() {
        assert_eq!(pointer_segments(""), Vec::<String>::new());
        assert_eq!(pointer_segments("/a~1b/0/c~0d"), vec!["a/b", "0", "c~d"]);
    }

    #[test]
    fn violation_display_lists_context() {
        let violation = SchemaViolation {
            message: "1 is not of type \"boolean\"".to_string(),
            instance_path: vec!["queries".into(), "0".into(), "enabled".into()],
            schema_path: vec!["properties".into(), "enabled".into(), "type".into()],
            value: "1".to_string(),
        };

        let text = violation.to_string();
        assert!(text.contains("Path: queries -> 0 -> enabled"));
        assert!(text.contains("Schema constraint: properties -> enabled -> type"));
        assert!(text.contains("Invalid value: 1"));
    }

    #[test]
    fn validate_value_error_carries_source_name() {
        let validator = SchemaValidator::embedded().unwrap();
        let err = validator
            .validate_value(&json!({"queries": 3}), "defs.yaml")
            .unwrap_err();

        match err {
            QueryGenError::SchemaViolation {
                source_name,
                violations,
            } => {
                assert_eq!(source_name, "defs.yaml");
                assert!(!violations.is_empty());
            }
            other => panic!("Expected SchemaViolation, got: {:?}", other),
        }
    }

    // === sources ===

    #[test]
    fn string_and_value_sources_agree() {
        let validator = SchemaValidator::embedded().unwrap();
        let yaml = "queries:\n  - name: A\n    return_type: int\n    parameters: []\n";

        assert!(validator.validate_str(yaml, "inline").is_ok());
        assert!(validator.validate_value(&valid_document(), "value").is_ok());
        assert!(validator.validate_str("queries: {}", "inline").is_err());
    }

    #[test]
    fn invalid_yaml_string_is_a_load_error() {
        let validator = SchemaValidator::embedded().unwrap();
        let err = validator.validate_str("queries: [", "inline").unwrap_err();
        assert!(matches!(err, QueryGenError::MalformedInput { .. }));
    }

    #[test]
    fn batch_collects_failures_without_stopping() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.yaml");
        let bad = temp_dir.path().join("bad.yaml");
        let missing = temp_dir.path().join("missing.yaml");
        fs::write(&good, "queries: []\n").unwrap();
        fs::write(&bad, "queries: nope\n").unwrap();

        let validator = SchemaValidator::embedded().unwrap();
        let report = validator.validate_batch(&[
            (bad.clone(), "bad".to_string()),
            (good, "good".to_string()),
            (missing, "missing".to_string()),
        ]);

        assert_eq!(report.checked, 3);
        assert!(!report.all_valid());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].source_name, "bad");
        assert!(matches!(
            report.failures[1].error,
            QueryGenError::NotFound { .. }
        ));
    }

    #[test]
    fn repeated_path_failures_are_indexed_separately() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.yaml");
        let bad = temp_dir.path().join("bad.yaml");
        fs::write(&good, "queries: []\n").unwrap();
        fs::write(&bad, "queries: nope\n").unwrap();

        let validator = SchemaValidator::embedded().unwrap();
        let report = validator.validate_batch(&[
            (bad.clone(), "bad".to_string()),
            (good, "good".to_string()),
            (bad, "bad".to_string()),
        ]);

        let indices: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(report.failure_at(0).is_some());
        assert!(report.failure_at(1).is_none());
        assert_eq!(report.failure_at(2).map(|f| f.index), Some(2));
    }

    // === schema loading and policy ===

    #[test]
    fn missing_schema_file_is_unavailable() {
        let err = SchemaValidator::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, QueryGenError::SchemaUnavailable { .. }));
    }

    #[test]
    fn unparseable_schema_file_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SchemaValidator::from_path(&path).unwrap_err();
        match err {
            QueryGenError::SchemaUnavailable { reason, .. } => {
                assert!(reason.contains("invalid JSON"))
            }
            other => panic!("Expected SchemaUnavailable, got: {:?}", other),
        }
    }

    #[test]
    fn schema_file_override_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.json");
        fs::write(&path, r#"{"type": "object", "required": ["custom"]}"#).unwrap();

        let validator = SchemaValidator::from_path(&path).unwrap();
        assert_eq!(validator.origin(), &SchemaOrigin::File(path));
        assert!(validator.validate_value(&valid_document(), "input").is_err());
    }

    #[test]
    fn disabled_policy_resolves_to_none() {
        let resolved = resolve_validator(SchemaPolicy::Disabled, None).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn best_effort_degrades_missing_schema() {
        let resolved =
            resolve_validator(SchemaPolicy::BestEffort, Some(Path::new("/nope/schema.json")))
                .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn required_policy_fails_on_missing_schema() {
        let err = resolve_validator(SchemaPolicy::Required, Some(Path::new("/nope/schema.json")))
            .unwrap_err();
        assert!(matches!(err, QueryGenError::SchemaUnavailable { .. }));
    }

    #[test]
    fn default_schema_is_resolved_without_override() {
        let resolved = resolve_validator(SchemaPolicy::Required, None).unwrap();
        assert_eq!(
            resolved.map(|v| v.origin().clone()),
            Some(SchemaOrigin::Embedded)
        );
    }
}
