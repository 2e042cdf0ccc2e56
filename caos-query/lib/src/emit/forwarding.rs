//! Forwarding implementations that delegate each query to an inner member.
//!
//! `Cache` and `Database` both wrap a concrete backend and forward every
//! `IQuery` method to it:
//!
//! ```text
//! #define QUERY_FORWARDING_CACHE() \
//!     int Cache::IQuery_Add(int a, int b) { \
//!         return this->cache->IQuery_Add(a, b); \
//!     }
//! ```

use crate::definition::QueryDefinition;

use super::{GuardedHeader, continuation_macro};

/// Class whose methods are generated as forwarders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingTarget {
    Cache,
    Database,
}

impl ForwardingTarget {
    pub fn class_name(&self) -> &'static str {
        match self {
            ForwardingTarget::Cache => "Cache",
            ForwardingTarget::Database => "Database",
        }
    }

    /// The member the calls are delegated to.
    pub fn member(&self) -> &'static str {
        match self {
            ForwardingTarget::Cache => "cache",
            ForwardingTarget::Database => "database",
        }
    }

    pub fn macro_name(&self) -> &'static str {
        match self {
            ForwardingTarget::Cache => "QUERY_FORWARDING_CACHE",
            ForwardingTarget::Database => "QUERY_FORWARDING_DATABASE",
        }
    }

    pub fn guard(&self) -> &'static str {
        match self {
            ForwardingTarget::Cache => "CACHE_QUERY_FORWARDING_HPP",
            ForwardingTarget::Database => "DATABASE_QUERY_FORWARDING_HPP",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ForwardingTarget::Cache => "Cache_Query_Forwarding.hpp",
            ForwardingTarget::Database => "Database_Query_Forwarding.hpp",
        }
    }
}

/// Renders the forwarding header for `target`.
pub fn render_forwarding(target: ForwardingTarget, definitions: &[QueryDefinition]) -> String {
    let items = definitions
        .iter()
        .map(|def| forwarding_method(target, def))
        .collect();

    let mut header = GuardedHeader::new(target.guard());
    header.lines(continuation_macro(target.macro_name(), items));
    header.finish()
}

/// The three fused lines of one forwarding method.
fn forwarding_method(target: ForwardingTarget, def: &QueryDefinition) -> String {
    format!(
        "    {ret} {class}::{name}({full}) {{ \\\n        return this->{member}->{name}({call}); \\\n    }}",
        ret = def.return_type,
        class = target.class_name(),
        name = def.name,
        full = def.full_params,
        member = target.member(),
        call = def.call_params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::test_support::*;

    #[test]
    fn cache_forwarding_for_two_queries() {
        let text = render_forwarding(ForwardingTarget::Cache, &[status(), add()]);

        assert_eq!(
            text,
            "\
// Auto-generated file - DO NOT EDIT MANUALLY
#ifndef CACHE_QUERY_FORWARDING_HPP
#define CACHE_QUERY_FORWARDING_HPP

#define QUERY_FORWARDING_CACHE() \\
    std::string Cache::IQuery_GetStatus() { \\
        return this->cache->IQuery_GetStatus(); \\
    } \\
    int Cache::IQuery_Add(int a, int b) { \\
        return this->cache->IQuery_Add(a, b); \\
    }

#endif // CACHE_QUERY_FORWARDING_HPP
"
        );
    }

    #[test]
    fn database_forwarding_targets_database_member() {
        let text = render_forwarding(ForwardingTarget::Database, &[echo()]);

        assert!(text.contains(
            "    std::string Database::IQuery_Example_Echo(const std::string& message) { \\"
        ));
        assert!(text.contains("        return this->database->IQuery_Example_Echo(message); \\"));
        assert!(!text.contains("cache"));
        assert_continuations(&text, "QUERY_FORWARDING_DATABASE");
        assert_guarded(&text, "DATABASE_QUERY_FORWARDING_HPP");
    }

    #[test]
    fn every_line_but_the_last_continues() {
        let text = render_forwarding(ForwardingTarget::Cache, &[status(), echo(), add()]);
        assert_continuations(&text, "QUERY_FORWARDING_CACHE");
    }

    #[test]
    fn empty_set_defines_empty_macro() {
        for target in [ForwardingTarget::Cache, ForwardingTarget::Database] {
            let text = render_forwarding(target, &[]);
            assert!(text.contains(&format!(
                "// No queries defined\n#define {}()\n",
                target.macro_name()
            )));
            assert_guarded(&text, target.guard());
        }
    }
}
