//! `IQuery` interface macros: pure virtual declarations and overrides.

use crate::definition::QueryDefinition;

use super::{GuardedHeader, continuation_macro};

/// Renders `Query_Definition.hpp`, declaring each query as pure virtual.
///
/// ```text
/// #define QUERY_DEFINITION() \
///     virtual std::string IQuery_GetStatus() = 0;
/// ```
pub fn render_query_definition(definitions: &[QueryDefinition]) -> String {
    render_declarations("QUERY_DEFINITION_HPP", "QUERY_DEFINITION", "= 0", definitions)
}

/// Renders `Query_Override.hpp`, declaring each query as an override.
pub fn render_query_override(definitions: &[QueryDefinition]) -> String {
    render_declarations("QUERY_OVERRIDE_HPP", "QUERY_OVERRIDE", "override", definitions)
}

fn render_declarations(
    guard: &'static str,
    macro_name: &str,
    specifier: &str,
    definitions: &[QueryDefinition],
) -> String {
    let items = definitions
        .iter()
        .map(|def| {
            format!(
                "    virtual {} {}({}) {};",
                def.return_type, def.name, def.full_params, specifier
            )
        })
        .collect();

    let mut header = GuardedHeader::new(guard);
    header.lines(continuation_macro(macro_name, items));
    header.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::test_support::*;

    #[test]
    fn definition_for_single_query() {
        let text = render_query_definition(&[status()]);

        assert_eq!(
            text,
            "\
// Auto-generated file - DO NOT EDIT MANUALLY
#ifndef QUERY_DEFINITION_HPP
#define QUERY_DEFINITION_HPP

#define QUERY_DEFINITION() \\
    virtual std::string IQuery_GetStatus() = 0;

#endif // QUERY_DEFINITION_HPP
"
        );
    }

    #[test]
    fn definition_lists_queries_in_order_with_continuations() {
        let text = render_query_definition(&[status(), echo(), add()]);

        let status_at = text.find("IQuery_GetStatus").unwrap();
        let echo_at = text.find("IQuery_Example_Echo").unwrap();
        let add_at = text.find("IQuery_Add").unwrap();
        assert!(status_at < echo_at && echo_at < add_at);

        assert!(text.contains(
            "    virtual std::string IQuery_Example_Echo(const std::string& message) = 0; \\"
        ));
        assert!(text.contains("    virtual int IQuery_Add(int a, int b) = 0;\n"));
        assert_continuations(&text, "QUERY_DEFINITION");
        assert_guarded(&text, "QUERY_DEFINITION_HPP");
    }

    #[test]
    fn override_uses_override_specifier() {
        let text = render_query_override(&[status(), add()]);

        assert!(text.contains("    virtual std::string IQuery_GetStatus() override; \\"));
        assert!(text.contains("    virtual int IQuery_Add(int a, int b) override;\n"));
        assert!(!text.contains("= 0"));
        assert_continuations(&text, "QUERY_OVERRIDE");
        assert_guarded(&text, "QUERY_OVERRIDE_HPP");
    }

    #[test]
    fn empty_set_defines_empty_macros() {
        let definition = render_query_definition(&[]);
        assert!(definition.contains("// No queries defined\n#define QUERY_DEFINITION()\n"));
        assert_guarded(&definition, "QUERY_DEFINITION_HPP");

        let override_text = render_query_override(&[]);
        assert!(override_text.contains("// No queries defined\n#define QUERY_OVERRIDE()\n"));
        assert_guarded(&override_text, "QUERY_OVERRIDE_HPP");
    }
}
