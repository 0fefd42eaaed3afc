//! W3C WebDriver wire types.
//!
//! This module defines the HTTP command and response format spoken with
//! geckodriver, chromedriver, or a Selenium grid.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `Command` | Local → Remote | Method, endpoint and JSON body |
//! | `Response` | Remote → Local | `{"value": ...}` result or error |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions and endpoints |
//! | `response` | Response parsing and error mapping |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions and endpoints.
pub mod command;

/// Response parsing and W3C error mapping.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, ELEMENT_KEY, HttpMethod, element_reference};
pub use response::{Response, WireError, element_id_from, element_ids_from};
