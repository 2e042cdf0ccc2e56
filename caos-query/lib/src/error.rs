//! Error types for the query generator.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaViolation;

/// Errors that can occur while loading, validating, normalizing or emitting
/// query definitions.
#[derive(Debug, Error)]
pub enum QueryGenError {
    /// A required input file does not exist.
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Reading an input file failed for a reason other than absence.
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structured input could not be parsed.
    #[error("invalid YAML format in {source_name}: {message}")]
    MalformedInput { source_name: String, message: String },

    /// The structured input contains no document.
    #[error("{source_name} is empty")]
    EmptyInput { source_name: String },

    /// The structured input contains more than one top-level document.
    #[error(
        "{source_name} contains {count} documents; expected a single document with a 'queries' root"
    )]
    MultiDocumentNotSupported { source_name: String, count: usize },

    /// The document failed schema validation.
    ///
    /// `violations` is never empty.
    #[error("schema validation failed for {source_name}: {}", summarize(.violations))]
    SchemaViolation {
        source_name: String,
        violations: Vec<SchemaViolation>,
    },

    /// The schema itself could not be loaded while validation was required.
    #[error("schema unavailable at '{}': {reason}", .path.display())]
    SchemaUnavailable { path: PathBuf, reason: String },

    /// A query definition is semantically invalid.
    #[error("query definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Failed to write a generated artifact.
    #[error("failed to write output file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn summarize(violations: &[SchemaViolation]) -> String {
    match violations {
        [] => "no violations reported".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

/// Convenience Result type for generator operations.
pub type Result<T> = std::result::Result<T, QueryGenError>;

/// Where in the definitions document a [`DefinitionError`] was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLocation {
    /// The document root (shape of the top-level mapping or `queries` list).
    Document,
    /// A single entry of the `queries` list.
    Entry { index: usize, name: Option<String> },
}

impl fmt::Display for EntryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryLocation::Document => write!(f, "document root"),
            EntryLocation::Entry {
                index,
                name: Some(name),
            } => write!(f, "query at index {index} ('{name}')"),
            EntryLocation::Entry { index, name: None } => write!(f, "query at index {index}"),
        }
    }
}

/// A semantic defect in the definitions document.
///
/// Processing stops at the first entry that produces one of these.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{location}: {kind}")]
pub struct DefinitionError {
    pub location: EntryLocation,
    pub kind: DefinitionErrorKind,
}

impl DefinitionError {
    pub fn at_document(kind: DefinitionErrorKind) -> Self {
        Self {
            location: EntryLocation::Document,
            kind,
        }
    }

    pub fn at_entry(index: usize, name: Option<&str>, kind: DefinitionErrorKind) -> Self {
        Self {
            location: EntryLocation::Entry {
                index,
                name: name.map(str::to_string),
            },
            kind,
        }
    }
}

/// The specific defect behind a [`DefinitionError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionErrorKind {
    /// The document root is not a mapping.
    #[error("YAML root must be a mapping")]
    RootNotMapping,

    /// The `queries` key holds something other than a list.
    #[error("'queries' must be a list")]
    QueriesNotList,

    /// A `queries` item is not a mapping.
    #[error("query entry must be a mapping")]
    EntryNotMapping,

    /// The entry has no `name`, or it is blank.
    #[error("query missing 'name' field")]
    MissingName,

    /// The entry name cannot be used as a C++ identifier.
    #[error("'{name}' is not a valid identifier")]
    InvalidName { name: String },

    /// A field holds a value of the wrong type.
    #[error("field '{field}' must be {expected}")]
    InvalidFieldType {
        field: String,
        expected: &'static str,
    },

    /// The explicit category is not one of the allowed values.
    #[error("invalid category '{category}'; must be 'standard', 'example', or 'template'")]
    InvalidCategory { category: String },

    /// A parameter is missing its type or name.
    #[error("parameter {position} missing type or name")]
    InvalidParameter { position: usize },

    /// A parameter name cannot be used as a C++ identifier.
    #[error("parameter {position} name '{name}' is not a valid identifier")]
    InvalidParameterName { position: usize, name: String },

    /// A type spliced into a generated macro contains a line break or other
    /// control character.
    #[error("field '{field}' contains a control character")]
    ControlCharacter { field: String },

    /// The authentication type is not supported by the generated headers.
    #[error("unsupported authentication type '{auth_type}'; only 'token' or 'none' are supported")]
    UnsupportedAuthType { auth_type: String },

    /// Another entry already uses this name.
    #[error("duplicate query name '{name}' (first defined at index {first_index})")]
    DuplicateName { name: String, first_index: usize },

    /// The entry is disabled but the flag that would enable its category was passed.
    #[error(
        "query is disabled (enabled: false) but the {flag} flag is present; either remove the flag or enable the query"
    )]
    DisabledButFlagged { flag: &'static str },
}
