//! `AuthConfig.hpp`: authentication metadata for the generated queries.
//!
//! The header always declares the same three symbols, whatever the input:
//!
//! - `AuthType` / `AuthConfig` - fixed type declarations
//! - `AutoToken` - env var names of TOKEN queries with `AUTO` key behavior
//! - `QUERY_AUTH_MAP` - method name to `(AuthType, env var)` for every
//!   authenticated query

use crate::definition::QueryDefinition;

use super::{GuardedHeader, NO_QUERIES_COMMENT, cpp_string};

const PREAMBLE: &[&str] = &[
    "#include <string>",
    "#include <unordered_map>",
    "#include <array>",
    "",
    "enum class AuthType { TOKEN };",
    "",
    "struct AuthConfig {",
    "    AuthType type;",
    "    std::string envVar;",
    "};",
    "",
];

/// Renders `AuthConfig.hpp`.
pub fn render_auth_config(definitions: &[QueryDefinition]) -> String {
    let mut header = GuardedHeader::new("AUTH_CONFIG_HPP");
    header.lines(PREAMBLE.iter().map(|line| line.to_string()));

    if definitions.is_empty() {
        header.line(NO_QUERIES_COMMENT);
    }

    let auto_tokens: Vec<&str> = definitions
        .iter()
        .filter(|def| def.is_auto_token())
        .filter_map(|def| def.authentication.as_ref())
        .map(|auth| auth.env_var.as_str())
        .collect();
    header.lines(auto_token_array(&auto_tokens));
    header.line("");

    let auth_entries: Vec<String> = definitions
        .iter()
        .filter_map(|def| {
            def.authentication.as_ref().map(|auth| {
                format!(
                    "    {{{}, {{AuthType::{}, {}}}}}",
                    cpp_string(&def.name),
                    auth.auth_type.as_str(),
                    cpp_string(&auth.env_var)
                )
            })
        })
        .collect();
    header.lines(initializer(
        "static std::unordered_map<std::string, AuthConfig> QUERY_AUTH_MAP",
        auth_entries,
    ));

    header.finish()
}

fn auto_token_array(env_vars: &[&str]) -> Vec<String> {
    let declaration = format!(
        "static constexpr std::array<const char*, {}> AutoToken",
        env_vars.len()
    );
    let entries = env_vars
        .iter()
        .map(|env_var| format!("    {}", cpp_string(env_var)))
        .collect();
    initializer(&declaration, entries)
}

/// `declaration = { ... };`, one comma-separated entry per line, or `= {};`.
fn initializer(declaration: &str, entries: Vec<String>) -> Vec<String> {
    if entries.is_empty() {
        return vec![format!("{declaration} = {{}};")];
    }

    let mut lines = Vec::with_capacity(entries.len() + 2);
    lines.push(format!("{declaration} = {{"));
    let last = entries.len() - 1;
    for (i, entry) in entries.into_iter().enumerate() {
        if i < last {
            lines.push(format!("{entry},"));
        } else {
            lines.push(entry);
        }
    }
    lines.push("};".to_string());
    lines
}
