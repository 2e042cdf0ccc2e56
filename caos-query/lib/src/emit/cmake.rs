//! `Query_Config.cmake`: per-query existence flags for the native build.

use crate::definition::QueryDefinition;

/// First line of the generated CMake fragment.
pub const CMAKE_MARKER: &str = "# Auto-generated CMake configuration - DO NOT EDIT MANUALLY";

/// Renders `Query_Config.cmake`.
///
/// Each query contributes a `QUERY_EXISTS_<name>` compile definition and a
/// matching CMake variable set to `TRUE`.
pub fn render_cmake_config(definitions: &[QueryDefinition]) -> String {
    let mut lines = vec![CMAKE_MARKER.to_string(), String::new()];

    if definitions.is_empty() {
        lines.push("# No query definitions found".to_string());
        lines.push("# target_compile_definitions will be empty".to_string());
        lines.push("# No individual query flags to set".to_string());
    } else {
        lines.push("# Query definitions found".to_string());
        lines.push("add_compile_definitions(".to_string());
        lines.extend(
            definitions
                .iter()
                .map(|def| format!("    QUERY_EXISTS_{}", def.name)),
        );
        lines.push(")".to_string());
        lines.push(String::new());
        lines.push("# Set individual query flags".to_string());
        lines.extend(
            definitions
                .iter()
                .map(|def| format!("set(QUERY_EXISTS_{} TRUE)", def.name)),
        );
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::test_support::*;

    #[test]
    fn flags_for_each_query() {
        let text = render_cmake_config(&[status(), add()]);

        assert_eq!(
            text,
            "\
# Auto-generated CMake configuration - DO NOT EDIT MANUALLY

# Query definitions found
add_compile_definitions(
    QUERY_EXISTS_IQuery_GetStatus
    QUERY_EXISTS_IQuery_Add
)

# Set individual query flags
set(QUERY_EXISTS_IQuery_GetStatus TRUE)
set(QUERY_EXISTS_IQuery_Add TRUE)
"
        );
    }

    #[test]
    fn empty_set_is_comment_only() {
        let text = render_cmake_config(&[]);

        assert!(text.starts_with(CMAKE_MARKER));
        assert!(text.contains("# No query definitions found"));
        assert!(!text.contains("add_compile_definitions("));
        assert!(!text.contains("set("));
    }
}
