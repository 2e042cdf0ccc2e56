//! Artifact emitters.
//!
//! Each emitter is a pure function from the ordered list of enabled
//! definitions to the full text of one output file. Emitters never see each
//! other's output, and every one of them produces a well-formed file for an
//! empty list.
//!
//! ## Artifacts
//!
//! | Artifact                         | File                            |
//! |----------------------------------|---------------------------------|
//! | [`Artifact::QueryDefinition`]    | `Query_Definition.hpp`          |
//! | [`Artifact::QueryOverride`]      | `Query_Override.hpp`            |
//! | [`Artifact::CacheForwarding`]    | `Cache_Query_Forwarding.hpp`    |
//! | [`Artifact::DatabaseForwarding`] | `Database_Query_Forwarding.hpp` |
//! | [`Artifact::AuthConfig`]         | `AuthConfig.hpp`                |
//! | [`Artifact::CmakeConfig`]        | `Query_Config.cmake`            |
//!
//! ## Examples
//!
//! ```
//! use caos_query_lib::emit::{render, Artifact};
//!
//! let header = render(Artifact::QueryDefinition, &[]);
//! assert!(header.contains("#define QUERY_DEFINITION()"));
//! assert!(header.contains("#endif // QUERY_DEFINITION_HPP"));
//! ```

pub mod auth;
pub mod cmake;
pub mod forwarding;
pub mod interface;

use tracing::debug;

use crate::definition::QueryDefinition;

pub use forwarding::ForwardingTarget;

/// First line of every generated C++ header.
pub const GENERATED_MARKER: &str = "// Auto-generated file - DO NOT EDIT MANUALLY";

/// Comment written in place of a macro body when no queries are enabled.
pub const NO_QUERIES_COMMENT: &str = "// No queries defined";

/// The six files produced by one generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    QueryDefinition,
    QueryOverride,
    CacheForwarding,
    DatabaseForwarding,
    AuthConfig,
    CmakeConfig,
}

impl Artifact {
    /// All artifacts, in the order they are written.
    pub const ALL: [Artifact; 6] = [
        Artifact::QueryDefinition,
        Artifact::QueryOverride,
        Artifact::CacheForwarding,
        Artifact::DatabaseForwarding,
        Artifact::AuthConfig,
        Artifact::CmakeConfig,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::QueryDefinition => "Query_Definition.hpp",
            Artifact::QueryOverride => "Query_Override.hpp",
            Artifact::CacheForwarding => ForwardingTarget::Cache.file_name(),
            Artifact::DatabaseForwarding => ForwardingTarget::Database.file_name(),
            Artifact::AuthConfig => "AuthConfig.hpp",
            Artifact::CmakeConfig => "Query_Config.cmake",
        }
    }
}

/// The rendered text of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub artifact: Artifact,
    pub content: String,
}

/// Renders a single artifact.
pub fn render(artifact: Artifact, definitions: &[QueryDefinition]) -> String {
    debug!("Generating {}", artifact.file_name());
    match artifact {
        Artifact::QueryDefinition => interface::render_query_definition(definitions),
        Artifact::QueryOverride => interface::render_query_override(definitions),
        Artifact::CacheForwarding => {
            forwarding::render_forwarding(ForwardingTarget::Cache, definitions)
        }
        Artifact::DatabaseForwarding => {
            forwarding::render_forwarding(ForwardingTarget::Database, definitions)
        }
        Artifact::AuthConfig => auth::render_auth_config(definitions),
        Artifact::CmakeConfig => cmake::render_cmake_config(definitions),
    }
}

/// Renders all six artifacts in [`Artifact::ALL`] order.
pub fn render_all(definitions: &[QueryDefinition]) -> Vec<RenderedArtifact> {
    Artifact::ALL
        .iter()
        .map(|&artifact| RenderedArtifact {
            artifact,
            content: render(artifact, definitions),
        })
        .collect()
}

/// Line-oriented builder for a header wrapped in an include guard.
pub(crate) struct GuardedHeader {
    guard: &'static str,
    lines: Vec<String>,
}

impl GuardedHeader {
    pub(crate) fn new(guard: &'static str) -> Self {
        let lines = vec![
            GENERATED_MARKER.to_string(),
            format!("#ifndef {guard}"),
            format!("#define {guard}"),
            String::new(),
        ];
        Self { guard, lines }
    }

    pub(crate) fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub(crate) fn lines(&mut self, lines: impl IntoIterator<Item = String>) -> &mut Self {
        self.lines.extend(lines);
        self
    }

    pub(crate) fn finish(mut self) -> String {
        self.lines.push(String::new());
        self.lines.push(format!("#endif // {}", self.guard));
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Lines of a function-like macro whose body is `items`, joined by line
/// continuations. An empty item list gives an empty macro.
pub(crate) fn continuation_macro(macro_name: &str, items: Vec<String>) -> Vec<String> {
    if items.is_empty() {
        return vec![NO_QUERIES_COMMENT.to_string(), format!("#define {macro_name}()")];
    }

    let last = items.len() - 1;
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(format!("#define {macro_name}() \\"));
    for (i, item) in items.into_iter().enumerate() {
        if i < last {
            lines.push(format!("{item} \\"));
        } else {
            lines.push(item);
        }
    }
    lines
}

/// Quotes `value` as a C++ string literal.
pub(crate) fn cpp_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
