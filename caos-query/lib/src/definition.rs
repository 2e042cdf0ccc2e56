//! Canonical query definition records.
//!
//! These are produced by [`crate::normalize`] and consumed by the policy and
//! the emitters. Once built, a [`QueryDefinition`] always satisfies its
//! invariants: a non-empty identifier name, a known category, complete
//! parameters and a consistent authentication setting.

use std::fmt;

/// Name prefix marking a query as an example.
pub const EXAMPLE_PREFIX: &str = "IQuery_Example_";

/// Name prefix marking a query as a template.
pub const TEMPLATE_PREFIX: &str = "IQuery_Template_";

/// Classification controlling whether a query is emitted by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Standard,
    Example,
    Template,
}

impl Category {
    /// Parses an explicit category value (already trimmed and lower-cased).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(Category::Standard),
            "example" => Some(Category::Example),
            "template" => Some(Category::Template),
            _ => None,
        }
    }

    /// Infers the category from the naming convention.
    ///
    /// ```
    /// use caos_query_lib::Category;
    ///
    /// assert_eq!(Category::infer("IQuery_Example_echoString"), Category::Example);
    /// assert_eq!(Category::infer("IQuery_Template_echoString"), Category::Template);
    /// assert_eq!(Category::infer("IQuery_GetStatus"), Category::Standard);
    /// ```
    pub fn infer(name: &str) -> Self {
        if name.starts_with(EXAMPLE_PREFIX) {
            Category::Example
        } else if name.starts_with(TEMPLATE_PREFIX) {
            Category::Template
        } else {
            Category::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Standard => "standard",
            Category::Example => "example",
            Category::Template => "template",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication mechanisms understood by the generated `AuthConfig.hpp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Token,
}

impl AuthType {
    /// The enumerator name used in C++ (`AuthType::TOKEN`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Token => "TOKEN",
        }
    }
}

/// How the key for an authenticated query is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBehavior {
    Required,
    Optional,
    /// Token generated automatically; listed in the `AutoToken` array.
    Auto,
}

impl KeyBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyBehavior::Required => "REQUIRED",
            KeyBehavior::Optional => "OPTIONAL",
            KeyBehavior::Auto => "AUTO",
        }
    }
}

/// Resolved authentication for a query that needs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub auth_type: AuthType,
    pub env_var: String,
    pub key_behavior: KeyBehavior,
}

/// One `(type, name)` method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
}

/// A normalized, validated query method definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub name: String,
    /// May be empty.
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    /// Declaration form: `"int x, std::string s"`.
    pub full_params: String,
    /// Call-site form: `"x, s"`.
    pub call_params: String,
    pub category: Category,
    /// `None` means the query requires no authentication.
    pub authentication: Option<Authentication>,
    pub enabled: bool,
}

impl QueryDefinition {
    /// Builds a definition, deriving both parameter strings.
    pub fn new(
        name: impl Into<String>,
        return_type: impl Into<String>,
        parameters: Vec<Parameter>,
        category: Category,
    ) -> Self {
        let (full_params, call_params) = render_parameters(&parameters);
        Self {
            name: name.into(),
            return_type: return_type.into(),
            parameters,
            full_params,
            call_params,
            category,
            authentication: None,
            enabled: true,
        }
    }

    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// True for TOKEN queries whose key is generated automatically.
    pub fn is_auto_token(&self) -> bool {
        matches!(
            self.authentication,
            Some(Authentication {
                auth_type: AuthType::Token,
                key_behavior: KeyBehavior::Auto,
                ..
            })
        )
    }
}

/// Renders parameters into declaration and call-site forms.
///
/// ```
/// use caos_query_lib::definition::{render_parameters, Parameter};
///
/// let params = vec![
///     Parameter { ty: "int".into(), name: "x".into() },
///     Parameter { ty: "string".into(), name: "s".into() },
/// ];
/// assert_eq!(
///     render_parameters(&params),
///     ("int x, string s".to_string(), "x, s".to_string())
/// );
/// ```
pub fn render_parameters(parameters: &[Parameter]) -> (String, String) {
    let full = parameters
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let call = parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    (full, call)
}
