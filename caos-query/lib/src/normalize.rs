//! Projection of loaded documents into [`QueryDefinition`] records.
//!
//! The loaded document is an untyped value tree. Each `queries` entry is
//! checked field by field and turned into a canonical record; the first
//! defect stops normalization with a [`DefinitionError`] naming the entry.
//!
//! ## Resolution Rules
//!
//! - **Category**: explicit `metadata.category` (trimmed, lower-cased), else
//!   inferred from the name prefix, else `standard`
//! - **Authentication**: absent, empty or `type: none` means no
//!   authentication; otherwise `type` is upper-cased, `env_var` trimmed and
//!   `required` (default `true`) selects `REQUIRED` or `OPTIONAL`
//! - **Enabled**: defaults to `true`
//! - **Names**: must be identifiers and unique across the document
//!
//! No rule produces [`KeyBehavior::Auto`]; the auto-token list emitted in
//! `AuthConfig.hpp` is therefore empty for every definitions file.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::definition::{AuthType, Authentication, Category, KeyBehavior, Parameter, QueryDefinition};
use crate::error::{DefinitionError, DefinitionErrorKind};

/// Normalizes every entry of a loaded definitions document.
///
/// A missing or null `queries` key yields an empty list.
///
/// ## Errors
///
/// Returns a [`DefinitionError`] for the first malformed entry, for a root
/// that is not a mapping, for a `queries` value that is not a list, and for
/// a name used by more than one entry.
pub fn normalize_document(document: &Value) -> Result<Vec<QueryDefinition>, DefinitionError> {
    let root = document
        .as_object()
        .ok_or_else(|| DefinitionError::at_document(DefinitionErrorKind::RootNotMapping))?;

    let entries = match root.get("queries") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(entries)) => entries.as_slice(),
        Some(_) => {
            return Err(DefinitionError::at_document(
                DefinitionErrorKind::QueriesNotList,
            ));
        }
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut definitions = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let definition = normalize_entry(index, entry)?;

        if let Some(&first_index) = seen.get(&definition.name) {
            return Err(DefinitionError::at_entry(
                index,
                Some(&definition.name),
                DefinitionErrorKind::DuplicateName {
                    name: definition.name.clone(),
                    first_index,
                },
            ));
        }
        seen.insert(definition.name.clone(), index);

        debug!(
            "Parsed query: {} (category: {})",
            definition.name, definition.category
        );
        definitions.push(definition);
    }

    info!("Successfully parsed {} queries", definitions.len());
    Ok(definitions)
}

/// Normalizes the entry at position `index` of the `queries` list.
pub fn normalize_entry(index: usize, entry: &Value) -> Result<QueryDefinition, DefinitionError> {
    let map = entry.as_object().ok_or_else(|| {
        DefinitionError::at_entry(index, None, DefinitionErrorKind::EntryNotMapping)
    })?;

    let name = optional_str(map, "name")
        .map_err(|kind| DefinitionError::at_entry(index, None, kind))?
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DefinitionError::at_entry(index, None, DefinitionErrorKind::MissingName))?;

    let fail = |kind| DefinitionError::at_entry(index, Some(name), kind);

    if !is_identifier(name) {
        return Err(fail(DefinitionErrorKind::InvalidName {
            name: name.to_string(),
        }));
    }

    let category = resolve_category(map, name).map_err(fail)?;
    let enabled = optional_bool(map, "enabled").map_err(fail)?.unwrap_or(true);
    let return_type = optional_str(map, "return_type")
        .map_err(fail)?
        .unwrap_or_default()
        .trim();
    reject_control_characters("return_type", return_type).map_err(fail)?;
    let parameters = parse_parameters(map.get("parameters")).map_err(fail)?;
    let authentication = parse_authentication(map.get("authentication")).map_err(fail)?;

    if let Some(auth) = &authentication
        && auth.env_var.is_empty()
    {
        warn!("Query '{name}' uses {} authentication without an env_var", auth.auth_type.as_str());
    }

    let mut definition = QueryDefinition::new(name, return_type, parameters, category)
        .with_enabled(enabled);
    definition.authentication = authentication;
    Ok(definition)
}

fn resolve_category(
    map: &Map<String, Value>,
    name: &str,
) -> Result<Category, DefinitionErrorKind> {
    let explicit = match map.get("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::Object(metadata)) => optional_str(metadata, "category")?,
        Some(_) => {
            return Err(DefinitionErrorKind::InvalidFieldType {
                field: "metadata".to_string(),
                expected: "a mapping",
            });
        }
    };

    let explicit = explicit.map(|c| c.trim().to_lowercase()).unwrap_or_default();
    if explicit.is_empty() {
        return Ok(Category::infer(name));
    }

    Category::parse(&explicit).ok_or(DefinitionErrorKind::InvalidCategory { category: explicit })
}

fn parse_parameters(value: Option<&Value>) -> Result<Vec<Parameter>, DefinitionErrorKind> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(DefinitionErrorKind::InvalidFieldType {
                field: "parameters".to_string(),
                expected: "a list",
            });
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let param = item
                .as_object()
                .ok_or(DefinitionErrorKind::InvalidParameter { position })?;

            let field = |key: &str| -> Result<String, DefinitionErrorKind> {
                optional_str(param, key)
                    .map_err(|_| DefinitionErrorKind::InvalidFieldType {
                        field: format!("parameters[{position}].{key}"),
                        expected: "a string",
                    })
                    .map(|v| v.unwrap_or_default().trim().to_string())
            };

            let ty = field("type")?;
            let name = field("name")?;
            if ty.is_empty() || name.is_empty() {
                return Err(DefinitionErrorKind::InvalidParameter { position });
            }
            reject_control_characters(&format!("parameters[{position}].type"), &ty)?;
            if !is_identifier(&name) {
                return Err(DefinitionErrorKind::InvalidParameterName { position, name });
            }
            Ok(Parameter { ty, name })
        })
        .collect()
}

fn parse_authentication(
    value: Option<&Value>,
) -> Result<Option<Authentication>, DefinitionErrorKind> {
    let config = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(config)) if config.is_empty() => return Ok(None),
        Some(Value::Object(config)) => config,
        Some(_) => {
            return Err(DefinitionErrorKind::InvalidFieldType {
                field: "authentication".to_string(),
                expected: "a mapping",
            });
        }
    };

    let auth_type = optional_str(config, "type")?
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    let auth_type = match auth_type.as_str() {
        "" | "NONE" => return Ok(None),
        "TOKEN" => AuthType::Token,
        _ => return Err(DefinitionErrorKind::UnsupportedAuthType { auth_type }),
    };

    let env_var = optional_str(config, "env_var")?
        .unwrap_or_default()
        .trim()
        .to_string();
    let key_behavior = if optional_bool(config, "required")?.unwrap_or(true) {
        KeyBehavior::Required
    } else {
        KeyBehavior::Optional
    };

    Ok(Some(Authentication {
        auth_type,
        env_var,
        key_behavior,
    }))
}

/// Reads an optional string field; null counts as absent.
fn optional_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, DefinitionErrorKind> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(DefinitionErrorKind::InvalidFieldType {
            field: key.to_string(),
            expected: "a string",
        }),
    }
}

/// Reads an optional boolean field; null counts as absent.
fn optional_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, DefinitionErrorKind> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(DefinitionErrorKind::InvalidFieldType {
            field: key.to_string(),
            expected: "a boolean",
        }),
    }
}

/// Types land inside `\`-continued macro lines, so they must stay on one line.
fn reject_control_characters(field: &str, value: &str) -> Result<(), DefinitionErrorKind> {
    if value.chars().any(char::is_control) {
        return Err(DefinitionErrorKind::ControlCharacter {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
