//! W3C WebDriver response parsing.
//!
//! Every remote-end reply is `{"value": ...}`. On failure the value is an
//! error object:
//!
//! ```json
//! {
//!   "value": {
//!     "error": "no such element",
//!     "message": "Unable to locate element",
//!     "stacktrace": ""
//!   }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;

use super::command::ELEMENT_KEY;

// ============================================================================
// Response
// ============================================================================

/// A response from the remote end.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Result or error payload.
    #[serde(default)]
    pub value: Value,
}

impl Response {
    /// Returns the error object if this response carries one.
    #[must_use]
    pub fn error(&self) -> Option<WireError> {
        let code = self.value.get("error")?.as_str()?.to_string();
        let message = self
            .value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(WireError { code, message })
    }

    /// Extracts the value, mapping error payloads and HTTP failures.
    ///
    /// `context` is the element the command targeted, used to build
    /// element-specific errors.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`Error`] if the response carries an error or
    /// `success` is false.
    pub fn into_result(self, success: bool, context: Option<&ElementId>) -> Result<Value> {
        if let Some(err) = self.error() {
            return Err(err.into_error(context));
        }
        if !success {
            return Err(Error::protocol(format!(
                "Unsuccessful response without error payload: {}",
                self.value
            )));
        }
        Ok(self.value)
    }
}

// ============================================================================
// WireError
// ============================================================================

/// Error code and message from a W3C error payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    /// W3C error code (e.g. `stale element reference`).
    pub code: String,
    /// Human readable message.
    pub message: String,
}

impl WireError {
    /// Maps the W3C error code to a crate [`Error`].
    #[must_use]
    pub fn into_error(self, context: Option<&ElementId>) -> Error {
        let element = || context.cloned().unwrap_or_else(|| ElementId::new("unknown"));

        match self.code.as_str() {
            "no such element" => Error::element_not_found(self.message),
            "stale element reference" | "detached shadow root" => Error::stale_element(element()),
            "element not interactable" => Error::not_interactable(element(), self.message),
            "element click intercepted" => Error::click_intercepted(element(), self.message),
            "invalid selector" => Error::invalid_selector("unknown", self.message),
            "javascript error" => Error::script_error(self.message),
            "timeout" | "script timeout" => Error::timeout(self.message, 0),
            "invalid session id" | "session not created" => Error::session(self.message),
            _ => Error::webdriver(self.code, self.message),
        }
    }
}

// ============================================================================
// Value Helpers
// ============================================================================

/// Reads a W3C element reference object.
#[must_use]
pub fn element_id_from(value: &Value) -> Option<ElementId> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementId::new)
}

/// Reads an array of element references.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the value is not an array.
pub fn element_ids_from(value: &Value) -> Result<Vec<ElementId>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::protocol(format!("Expected element array, got {value}")))?;
    Ok(items.iter().filter_map(element_id_from).collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json_str: &str) -> Response {
        serde_json::from_str(json_str).expect("parse")
    }

    #[test]
    fn test_success_response() {
        let response = parse(r#"{"value": "Example"}"#);
        assert!(response.error().is_none());
        let value = response.into_result(true, None).expect("should succeed");
        assert_eq!(value, "Example");
    }

    #[test]
    fn test_null_value_response() {
        let response = parse(r#"{"value": null}"#);
        assert_eq!(response.into_result(true, None).unwrap(), Value::Null);
    }

    #[test]
    fn test_error_response_maps_stale() {
        let response = parse(
            r#"{"value": {"error": "stale element reference", "message": "gone", "stacktrace": ""}}"#,
        );
        let id = ElementId::new("e1");
        let err = response.into_result(false, Some(&id)).unwrap_err();
        assert!(matches!(err, Error::StaleElement { element_id } if element_id == id));
    }

    #[test]
    fn test_error_response_maps_intercepted() {
        let err = WireError {
            code: "element click intercepted".to_string(),
            message: "overlay".to_string(),
        }
        .into_error(None);
        assert!(err.is_interaction_blocked());
    }

    #[test]
    fn test_unknown_code_kept() {
        let err = WireError {
            code: "unsupported operation".to_string(),
            message: "nope".to_string(),
        }
        .into_error(None);
        assert!(matches!(err, Error::WebDriver { ref code, .. } if code == "unsupported operation"));
    }

    #[test]
    fn test_http_failure_without_payload() {
        let response = parse(r#"{"value": "oops"}"#);
        assert!(matches!(
            response.into_result(false, None),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_element_ids_from_array() {
        let value = serde_json::json!([
            {ELEMENT_KEY: "a"},
            {ELEMENT_KEY: "b"},
        ]);
        let ids = element_ids_from(&value).unwrap();
        assert_eq!(ids, vec![ElementId::new("a"), ElementId::new("b")]);
    }

    #[test]
    fn test_element_ids_from_non_array() {
        assert!(element_ids_from(&serde_json::json!({})).is_err());
    }
}
