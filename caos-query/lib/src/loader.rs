//! YAML loading for query definition documents.
//!
//! Every source (file or in-memory string) goes through the same routine:
//! the content is split into YAML documents, exactly one document is
//! accepted, and it is converted into a [`serde_json::Value`] tree so the
//! schema validator and the normalizer work on one representation.
//!
//! ## Examples
//!
//! ```
//! use caos_query_lib::loader::load_str;
//!
//! let doc = load_str("queries: []", "inline").unwrap();
//! assert!(doc["queries"].as_array().unwrap().is_empty());
//!
//! let err = load_str("a: 1\n---\nb: 2\n", "inline").unwrap_err();
//! assert!(err.to_string().contains("2 documents"));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{QueryGenError, Result};

/// Number of leading lines shown by [`diagnose_structure`].
const DIAGNOSE_HEAD_LINES: usize = 10;

/// Loads the definitions document at `path`.
///
/// ## Errors
///
/// - [`QueryGenError::NotFound`] if `path` does not exist
/// - [`QueryGenError::Io`] if the file cannot be read
/// - [`QueryGenError::MalformedInput`] if the YAML cannot be parsed
/// - [`QueryGenError::EmptyInput`] if the file holds no document
/// - [`QueryGenError::MultiDocumentNotSupported`] if it holds more than one
pub fn load_file(path: &Path) -> Result<Value> {
    let content = read_source(path)?;
    debug!("Loaded {} bytes from {}", content.len(), path.display());
    load_str(&content, &path.display().to_string())
}

/// Loads a definitions document from an in-memory string.
///
/// `source_name` is only used in error messages.
pub fn load_str(content: &str, source_name: &str) -> Result<Value> {
    let document = single_document(content, source_name)?;
    serde_json::to_value(&document).map_err(|e| QueryGenError::MalformedInput {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            QueryGenError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            QueryGenError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn parse_documents(content: &str, source_name: &str) -> Result<Vec<serde_yaml::Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let mut value = serde_yaml::Value::deserialize(document).map_err(|e| {
            QueryGenError::MalformedInput {
                source_name: source_name.to_string(),
                message: e.to_string(),
            }
        })?;
        value
            .apply_merge()
            .map_err(|e| QueryGenError::MalformedInput {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        documents.push(value);
    }
    Ok(documents)
}

fn single_document(content: &str, source_name: &str) -> Result<serde_yaml::Value> {
    let mut documents = parse_documents(content, source_name)?;
    match documents.len() {
        0 => Err(QueryGenError::EmptyInput {
            source_name: source_name.to_string(),
        }),
        1 => match documents.pop() {
            Some(serde_yaml::Value::Null) | None => Err(QueryGenError::EmptyInput {
                source_name: source_name.to_string(),
            }),
            Some(document) => Ok(document),
        },
        count => Err(QueryGenError::MultiDocumentNotSupported {
            source_name: source_name.to_string(),
            count,
        }),
    }
}

// ============================================================================
// Structure diagnosis
// ============================================================================

/// Shape of one YAML document, as reported by [`diagnose_structure`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// The document is empty (null).
    Empty,
    /// A mapping; each top-level key with a short description of its value.
    Mapping(Vec<(String, String)>),
    /// Any other value.
    Other { kind: &'static str, preview: String },
}

/// Structural overview of a YAML file, used to explain why it failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    pub path: PathBuf,
    pub head: Vec<String>,
    /// Empty when the content could not be parsed.
    pub documents: Vec<DocumentShape>,
    pub has_separators: bool,
    /// Parser message for content that is not valid YAML.
    pub parse_error: Option<String>,
}

/// Examines the document layout of the YAML file at `path`.
///
/// Unlike [`load_file`], multiple documents and malformed YAML are not errors
/// here; they are what this report is meant to reveal. Only an unreadable
/// file fails.
pub fn diagnose_structure(path: &Path) -> Result<StructureReport> {
    let content = read_source(path)?;
    let source_name = path.display().to_string();

    let head = content
        .lines()
        .take(DIAGNOSE_HEAD_LINES)
        .map(str::to_string)
        .collect();

    let (documents, parse_error) = match parse_documents(&content, &source_name) {
        Ok(documents) => (documents.iter().map(document_shape).collect(), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    Ok(StructureReport {
        path: path.to_path_buf(),
        head,
        documents,
        has_separators: content.lines().any(is_document_separator),
        parse_error,
    })
}

/// `---` alone, or followed by whitespace (`--- # note`, `--- !tag`).
fn is_document_separator(line: &str) -> bool {
    line.strip_prefix("---")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn document_shape(value: &serde_yaml::Value) -> DocumentShape {
    match value {
        serde_yaml::Value::Null => DocumentShape::Empty,
        serde_yaml::Value::Mapping(map) => DocumentShape::Mapping(
            map.iter()
                .map(|(key, value)| {
                    let key = match key {
                        serde_yaml::Value::String(s) => s.clone(),
                        other => preview(other),
                    };
                    let description = match value {
                        serde_yaml::Value::Sequence(items) => {
                            format!("list with {} items", items.len())
                        }
                        other => kind_name(other).to_string(),
                    };
                    (key, description)
                })
                .collect(),
        ),
        other => DocumentShape::Other {
            kind: kind_name(other),
            preview: preview(other),
        },
    }
}

fn kind_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "list",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}

fn preview(value: &serde_yaml::Value) -> String {
    let text = serde_yaml::to_string(value).unwrap_or_default();
    let text = text.trim_end();
    if text.chars().count() > 100 {
        format!("{}...", text.chars().take(100).collect::<String>())
    } else {
        text.to_string()
    }
}

impl fmt::Display for StructureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "─".repeat(60);
        writeln!(f, "Diagnosing YAML structure: {}", self.path.display())?;
        writeln!(f, "{rule}")?;
        writeln!(f, "First {} lines:", DIAGNOSE_HEAD_LINES)?;
        for (i, line) in self.head.iter().enumerate() {
            writeln!(f, "  {:3}: {}", i + 1, line)?;
        }
        writeln!(f)?;
        writeln!(f, "{rule}")?;

        if let Some(error) = &self.parse_error {
            writeln!(f, "Error during diagnosis: {error}")?;
        } else {
            writeln!(f, "Number of YAML documents found: {}", self.documents.len())?;
        }

        for (i, document) in self.documents.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "Document {}:", i + 1)?;
            match document {
                DocumentShape::Empty => writeln!(f, "  (empty document)")?,
                DocumentShape::Mapping(entries) => {
                    let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                    writeln!(f, "  Type: mapping with keys: {}", keys.join(", "))?;
                    for (key, description) in entries {
                        writeln!(f, "  - {key}: {description}")?;
                    }
                }
                DocumentShape::Other { kind, preview } => {
                    writeln!(f, "  Type: {kind}")?;
                    writeln!(f, "  Content: {preview}")?;
                }
            }
        }

        if self.has_separators {
            writeln!(f)?;
            writeln!(f, "Found '---' document separators in YAML")?;
            writeln!(
                f,
                "   The schema expects a single document with 'queries' root."
            )?;
            writeln!(f, "   Remove '---' separators or combine documents.")?;
        }
        Ok(())
    }
}

// ============================================================================
// File discovery
// ============================================================================

/// Expands `paths` into the definitions files they name.
///
/// Directories contribute their immediate `*.yaml` / `*.yml` children,
/// sorted by file name. Any other path is passed through unchanged, so a
/// missing file is reported when it is loaded.
pub fn find_definition_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| QueryGenError::Io {
                path: path.clone(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() && is_yaml(entry.path()) {
                files.push(entry.into_path());
            }
        }
        debug!("Scanned {} for definitions files", path.display());
    }

    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}
