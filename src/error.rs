//! Error types for the resilient UI engine.
//!
//! Driver backends return these errors; the engine layer converts most of
//! them into result values ("absent", "not yet satisfied", `SoftFail`)
//! instead of propagating them.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Session | [`Error::Connection`], [`Error::Session`], [`Error::Protocol`] |
//! | Element | [`Error::InvalidSelector`], [`Error::ElementNotFound`], [`Error::StaleElement`] |
//! | Interaction | [`Error::NotInteractable`], [`Error::ClickIntercepted`] |
//! | Execution | [`Error::ScriptError`], [`Error::Timeout`], [`Error::WebDriver`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Http`], [`Error::Url`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::ElementId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when engine or browser options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Could not reach the WebDriver endpoint.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Session is invalid or was already closed.
    #[error("Session error: {message}")]
    Session {
        /// Description of the session error.
        message: String,
    },

    /// Unexpected response shape from the remote end.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// Selector syntax is not valid for the current page or backend.
    #[error("Invalid selector {selector}: {message}")]
    InvalidSelector {
        /// Selector that was rejected.
        selector: String,
        /// Reason reported by the backend.
        message: String,
    },

    /// No element matched the selector.
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector used.
        selector: String,
    },

    /// Element reference is no longer attached to the DOM.
    #[error("Stale element: {element_id}")]
    StaleElement {
        /// The stale element's ID.
        element_id: ElementId,
    },

    // ========================================================================
    // Interaction Errors
    // ========================================================================
    /// Element exists but cannot receive the interaction.
    #[error("Element not interactable: {element_id}: {message}")]
    NotInteractable {
        /// The element's ID.
        element_id: ElementId,
        /// Reason reported by the backend.
        message: String,
    },

    /// Another element would receive the click (overlay, animation).
    #[error("Click intercepted on {element_id}: {message}")]
    ClickIntercepted {
        /// The element's ID.
        element_id: ElementId,
        /// Reason reported by the backend.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Injected script failed.
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message from script execution.
        message: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Any other W3C error code.
    #[error("WebDriver error {code}: {message}")]
    WebDriver {
        /// W3C error code (e.g. `unknown error`).
        code: String,
        /// Error message from the remote end.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Base64 decode error (screenshots).
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a session error.
    #[inline]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElement { element_id }
    }

    /// Creates a not interactable error.
    #[inline]
    pub fn not_interactable(element_id: ElementId, message: impl Into<String>) -> Self {
        Self::NotInteractable {
            element_id,
            message: message.into(),
        }
    }

    /// Creates a click intercepted error.
    #[inline]
    pub fn click_intercepted(element_id: ElementId, message: impl Into<String>) -> Self {
        Self::ClickIntercepted {
            element_id,
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a generic WebDriver error from a W3C error code.
    #[inline]
    pub fn webdriver(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WebDriver {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is an element lookup error.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::StaleElement { .. } | Self::InvalidSelector { .. }
        )
    }

    /// Returns `true` if the element was found but the interaction was blocked.
    ///
    /// These errors trigger the script fallback in the action executor.
    #[inline]
    #[must_use]
    pub fn is_interaction_blocked(&self) -> bool {
        matches!(
            self,
            Self::NotInteractable { .. } | Self::ClickIntercepted { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if this is a stale element error.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Returns `true` if this error may clear up on retry.
    ///
    /// The convergence poller treats these as "not yet satisfied".
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::StaleElement { .. }
                | Self::ElementNotFound { .. }
                | Self::NotInteractable { .. }
                | Self::ClickIntercepted { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("poll interval must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: poll interval must be positive"
        );
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("wait_for(cart-root)", 5000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_interaction_blocked() {
        let id = ElementId::new("e-1");
        assert!(Error::not_interactable(id.clone(), "hidden").is_interaction_blocked());
        assert!(Error::click_intercepted(id.clone(), "overlay").is_interaction_blocked());
        assert!(!Error::stale_element(id).is_interaction_blocked());
    }

    #[test]
    fn test_is_element_error() {
        assert!(Error::element_not_found("css:.cart").is_element_error());
        assert!(Error::invalid_selector("xpath://a", "unsupported").is_element_error());
        assert!(!Error::script_error("boom").is_element_error());
    }

    #[test]
    fn test_stale_is_retryable_config_is_not() {
        let stale = Error::stale_element(ElementId::new("e-2"));
        assert!(stale.is_stale() && stale.is_recoverable());
        assert!(!Error::config("poll interval is zero").is_recoverable());
    }

    #[test]
    fn test_screenshot_write_failure_converts() {
        let err: Error = IoError::new(ErrorKind::PermissionDenied, "read-only dir").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_element_error());
    }

    #[test]
    fn test_malformed_response_body_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{\"value\":")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Json(_)));
    }
}
