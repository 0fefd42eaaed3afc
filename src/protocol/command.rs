//! W3C WebDriver command definitions.
//!
//! Each command knows its HTTP method, its endpoint below the session URL,
//! and its JSON body.
//!
//! # Endpoints
//!
//! | Command | Method | Path |
//! |---------|--------|------|
//! | `NewSession` | POST | `/session` |
//! | `DeleteSession` | DELETE | `/session/{id}` |
//! | `Navigate` | POST | `/session/{id}/url` |
//! | `FindElements` | POST | `/session/{id}/elements` |
//! | `FindElementsFromElement` | POST | `/session/{id}/element/{e}/elements` |
//! | `ElementClick` | POST | `/session/{id}/element/{e}/click` |
//! | `ExecuteScript` | POST | `/session/{id}/execute/sync` |
//! | `TakeScreenshot` | GET | `/session/{id}/screenshot` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use urlencoding::encode;

use crate::identifiers::{ElementId, SessionId};

// ============================================================================
// Constants
// ============================================================================

/// W3C web element identifier key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecc";

// ============================================================================
// HttpMethod
// ============================================================================

/// HTTP verb used by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request, no body.
    Get,
    /// POST request with JSON body.
    Post,
    /// DELETE request, no body.
    Delete,
}

// ============================================================================
// Command
// ============================================================================

/// W3C WebDriver commands used by this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a session.
    NewSession {
        /// `{"alwaysMatch": ...}` capabilities object.
        capabilities: Value,
    },

    /// End the session.
    DeleteSession,

    /// Navigate to URL.
    Navigate {
        /// URL to navigate to.
        url: String,
    },

    /// Get current URL.
    GetCurrentUrl,

    /// Get page title.
    GetTitle,

    /// Find all elements from the document root.
    FindElements {
        /// W3C location strategy.
        using: &'static str,
        /// Selector value.
        value: String,
    },

    /// Find all elements below an element.
    FindElementsFromElement {
        /// Parent element.
        element_id: ElementId,
        /// W3C location strategy.
        using: &'static str,
        /// Selector value.
        value: String,
    },

    /// Native click.
    ElementClick {
        /// Target element.
        element_id: ElementId,
    },

    /// Clear editable element.
    ElementClear {
        /// Target element.
        element_id: ElementId,
    },

    /// Type text.
    ElementSendKeys {
        /// Target element.
        element_id: ElementId,
        /// Text to type.
        text: String,
    },

    /// Get rendered text.
    GetElementText {
        /// Target element.
        element_id: ElementId,
    },

    /// Get attribute value.
    GetElementAttribute {
        /// Target element.
        element_id: ElementId,
        /// Attribute name.
        name: String,
    },

    /// Is element displayed.
    IsElementDisplayed {
        /// Target element.
        element_id: ElementId,
    },

    /// Is element enabled.
    IsElementEnabled {
        /// Target element.
        element_id: ElementId,
    },

    /// Is element selected (checkbox, radio, option).
    IsElementSelected {
        /// Target element.
        element_id: ElementId,
    },

    /// Execute synchronous script.
    ExecuteScript {
        /// Script body; use `return` to return a value.
        script: String,
        /// Serialized arguments.
        args: Vec<Value>,
    },

    /// Capture viewport screenshot (base64 PNG).
    TakeScreenshot,
}

impl Command {
    /// Returns the HTTP method for this command.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::DeleteSession => HttpMethod::Delete,
            Self::GetCurrentUrl
            | Self::GetTitle
            | Self::GetElementText { .. }
            | Self::GetElementAttribute { .. }
            | Self::IsElementDisplayed { .. }
            | Self::IsElementEnabled { .. }
            | Self::IsElementSelected { .. }
            | Self::TakeScreenshot => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Returns the endpoint path relative to the remote end base URL.
    ///
    /// `session` is ignored for [`Command::NewSession`].
    #[must_use]
    pub fn path(&self, session: &SessionId) -> String {
        let s = encode(session.as_str());
        let el = |id: &ElementId| encode(id.as_str()).into_owned();

        match self {
            Self::NewSession { .. } => "session".to_string(),
            Self::DeleteSession => format!("session/{s}"),
            Self::Navigate { .. } | Self::GetCurrentUrl => format!("session/{s}/url"),
            Self::GetTitle => format!("session/{s}/title"),
            Self::FindElements { .. } => format!("session/{s}/elements"),
            Self::FindElementsFromElement { element_id, .. } => {
                format!("session/{s}/element/{}/elements", el(element_id))
            }
            Self::ElementClick { element_id } => {
                format!("session/{s}/element/{}/click", el(element_id))
            }
            Self::ElementClear { element_id } => {
                format!("session/{s}/element/{}/clear", el(element_id))
            }
            Self::ElementSendKeys { element_id, .. } => {
                format!("session/{s}/element/{}/value", el(element_id))
            }
            Self::GetElementText { element_id } => {
                format!("session/{s}/element/{}/text", el(element_id))
            }
            Self::GetElementAttribute { element_id, name } => format!(
                "session/{s}/element/{}/attribute/{}",
                el(element_id),
                encode(name)
            ),
            Self::IsElementDisplayed { element_id } => {
                format!("session/{s}/element/{}/displayed", el(element_id))
            }
            Self::IsElementEnabled { element_id } => {
                format!("session/{s}/element/{}/enabled", el(element_id))
            }
            Self::IsElementSelected { element_id } => {
                format!("session/{s}/element/{}/selected", el(element_id))
            }
            Self::ExecuteScript { .. } => format!("session/{s}/execute/sync"),
            Self::TakeScreenshot => format!("session/{s}/screenshot"),
        }
    }

    /// Returns the JSON body, `None` for GET and DELETE.
    #[must_use]
    pub fn body(&self) -> Option<Value> {
        match self.method() {
            HttpMethod::Get | HttpMethod::Delete => return None,
            HttpMethod::Post => {}
        }

        let body = match self {
            Self::NewSession { capabilities } => json!({ "capabilities": capabilities }),
            Self::Navigate { url } => json!({ "url": url }),
            Self::FindElements { using, value }
            | Self::FindElementsFromElement { using, value, .. } => {
                json!({ "using": using, "value": value })
            }
            Self::ElementSendKeys { text, .. } => json!({ "text": text }),
            Self::ExecuteScript { script, args } => json!({ "script": script, "args": args }),
            _ => json!({}),
        };
        Some(body)
    }

    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewSession { .. } => "newSession",
            Self::DeleteSession => "deleteSession",
            Self::Navigate { .. } => "navigate",
            Self::GetCurrentUrl => "getCurrentUrl",
            Self::GetTitle => "getTitle",
            Self::FindElements { .. } => "findElements",
            Self::FindElementsFromElement { .. } => "findElementsFromElement",
            Self::ElementClick { .. } => "elementClick",
            Self::ElementClear { .. } => "elementClear",
            Self::ElementSendKeys { .. } => "elementSendKeys",
            Self::GetElementText { .. } => "getElementText",
            Self::GetElementAttribute { .. } => "getElementAttribute",
            Self::IsElementDisplayed { .. } => "isElementDisplayed",
            Self::IsElementEnabled { .. } => "isElementEnabled",
            Self::IsElementSelected { .. } => "isElementSelected",
            Self::ExecuteScript { .. } => "executeScript",
            Self::TakeScreenshot => "takeScreenshot",
        }
    }
}

/// Serializes an element reference the way W3C expects it in script args.
#[must_use]
pub fn element_reference(id: &ElementId) -> Value {
    json!({ ELEMENT_KEY: id.as_str() })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionId {
        SessionId::new("abc")
    }

    #[test]
    fn test_find_elements_path_and_body() {
        let cmd = Command::FindElements {
            using: "css selector",
            value: "div.shelf-item".to_string(),
        };
        assert_eq!(cmd.method(), HttpMethod::Post);
        assert_eq!(cmd.path(&session()), "session/abc/elements");
        assert_eq!(
            cmd.body(),
            Some(json!({"using": "css selector", "value": "div.shelf-item"}))
        );
    }

    #[test]
    fn test_scoped_find_path() {
        let cmd = Command::FindElementsFromElement {
            element_id: ElementId::new("e1"),
            using: "xpath",
            value: ".//button".to_string(),
        };
        assert_eq!(cmd.path(&session()), "session/abc/element/e1/elements");
    }

    #[test]
    fn test_get_commands_have_no_body() {
        let cmd = Command::GetElementText {
            element_id: ElementId::new("e1"),
        };
        assert_eq!(cmd.method(), HttpMethod::Get);
        assert!(cmd.body().is_none());
        assert!(Command::DeleteSession.body().is_none());
    }

    #[test]
    fn test_click_has_empty_object_body() {
        let cmd = Command::ElementClick {
            element_id: ElementId::new("e1"),
        };
        assert_eq!(cmd.body(), Some(json!({})));
    }

    #[test]
    fn test_attribute_name_is_encoded() {
        let cmd = Command::GetElementAttribute {
            element_id: ElementId::new("e1"),
            name: "data id".to_string(),
        };
        assert_eq!(cmd.path(&session()), "session/abc/element/e1/attribute/data%20id");
    }

    #[test]
    fn test_selected_is_get() {
        let cmd = Command::IsElementSelected {
            element_id: ElementId::new("e4"),
        };
        assert_eq!(cmd.method(), HttpMethod::Get);
        assert_eq!(cmd.path(&session()), "session/abc/element/e4/selected");
        assert_eq!(cmd.name(), "isElementSelected");
    }

    #[test]
    fn test_element_reference_key() {
        let value = element_reference(&ElementId::new("e9"));
        assert_eq!(value[ELEMENT_KEY], "e9");
    }
}
