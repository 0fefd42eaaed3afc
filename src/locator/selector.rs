//! Element query descriptors.
//!
//! Provides Selenium-like `By` selectors. Each backend translates them into
//! its own query form; the W3C backend uses [`By::to_w3c`].
//!
//! # Example
//!
//! ```ignore
//! use resilient_ui::By;
//!
//! let cart = By::css("div.float-cart");
//! let subtotal = By::xpath("//*[contains(text(),'Subtotal')]");
//! let plus = By::partial_text("+");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// By
// ============================================================================

/// One way of locating elements.
///
/// Serialized as `{"using": "<kind>", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value", rename_all = "kebab-case")]
pub enum By {
    /// CSS selector.
    Css(String),
    /// XPath expression, evaluated relative to the search root.
    #[serde(rename = "xpath")]
    XPath(String),
    /// Whole trimmed text equals the value.
    Text(String),
    /// Own text contains the value, case-sensitive.
    PartialText(String),
    /// `id` attribute.
    Id(String),
    /// Tag name.
    Tag(String),
    /// `name` attribute, as on form inputs.
    Name(String),
    /// A single class.
    Class(String),
    /// Anchor whose text equals the value.
    LinkText(String),
    /// Anchor whose text contains the value.
    PartialLinkText(String),
}

impl By {
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[inline]
    pub fn partial_text(text: impl Into<String>) -> Self {
        Self::PartialText(text.into())
    }

    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    #[inline]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    #[inline]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    #[inline]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    #[inline]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::PartialLinkText(text.into())
    }

    /// Short kind label, matching the serialized `using` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Text(_) => "text",
            Self::PartialText(_) => "partial-text",
            Self::Id(_) => "id",
            Self::Tag(_) => "tag",
            Self::Name(_) => "name",
            Self::Class(_) => "class",
            Self::LinkText(_) => "link-text",
            Self::PartialLinkText(_) => "partial-link-text",
        }
    }

    /// The raw query string.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v)
            | Self::XPath(v)
            | Self::Text(v)
            | Self::PartialText(v)
            | Self::Id(v)
            | Self::Tag(v)
            | Self::Name(v)
            | Self::Class(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v) => v,
        }
    }

    /// Translates to a W3C location strategy and value.
    ///
    /// Text strategies become relative XPath so they also work when the
    /// search starts from an element.
    #[must_use]
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self {
            Self::Css(v) => ("css selector", v.clone()),
            Self::XPath(v) => ("xpath", v.clone()),
            Self::Tag(v) => ("tag name", v.clone()),
            Self::LinkText(v) => ("link text", v.clone()),
            Self::PartialLinkText(v) => ("partial link text", v.clone()),
            Self::Id(v) => ("css selector", format!("[id={}]", css_string(v))),
            Self::Name(v) => ("css selector", format!("[name={}]", css_string(v))),
            Self::Class(v) => ("css selector", format!(".{v}")),
            Self::Text(v) => (
                "xpath",
                format!(".//*[normalize-space(.)={}]", xpath_literal(v.trim())),
            ),
            Self::PartialText(v) => (
                "xpath",
                format!(".//*[contains(text(),{})]", xpath_literal(v)),
            ),
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.value())
    }
}

/// Bare strings are CSS.
impl From<&str> for By {
    fn from(selector: &str) -> Self {
        Self::css(selector)
    }
}

impl From<String> for By {
    fn from(selector: String) -> Self {
        Self::Css(selector)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Quotes a value for a CSS attribute selector.
fn css_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quotes a value as an XPath string literal.
///
/// XPath 1.0 has no escape sequences, so values containing both quote
/// kinds are split with `concat()`.
pub(crate) fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_string_is_css() {
        let by: By = "div.float-cart".into();
        assert_eq!(by, By::css("div.float-cart"));
        assert_eq!(by.to_string(), "css=div.float-cart");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(By::partial_link_text("Sign").kind(), "partial-link-text");
        assert_eq!(By::xpath("//p").kind(), "xpath");
        assert_eq!(By::name("email").value(), "email");
    }

    #[test]
    fn test_to_w3c_native_strategies() {
        assert_eq!(By::css("a").to_w3c(), ("css selector", "a".to_string()));
        assert_eq!(By::tag("button").to_w3c().0, "tag name");
        assert_eq!(By::link_text("Home").to_w3c().0, "link text");
    }

    #[test]
    fn test_to_w3c_id_is_quoted() {
        let (using, value) = By::id("login-btn").to_w3c();
        assert_eq!(using, "css selector");
        assert_eq!(value, "[id=\"login-btn\"]");
    }

    #[test]
    fn test_to_w3c_partial_text_is_relative_xpath() {
        let (using, value) = By::partial_text("+").to_w3c();
        assert_eq!(using, "xpath");
        assert_eq!(value, ".//*[contains(text(),'+')]");
    }

    #[test]
    fn test_xpath_literal_quotes() {
        assert_eq!(xpath_literal("abc"), "'abc'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(xpath_literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(By::partial_text("+")).unwrap();
        assert_eq!(json, serde_json::json!({"using": "partial-text", "value": "+"}));
        let back: By = serde_json::from_value(serde_json::json!({"using": "xpath", "value": "//p"})).unwrap();
        assert_eq!(back, By::xpath("//p"));
    }
}
