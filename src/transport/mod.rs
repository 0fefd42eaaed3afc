//! HTTP transport layer.
//!
//! Carries W3C WebDriver commands to the remote end (geckodriver,
//! chromedriver, Selenium grid).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  W3cDriver      │          HTTP/JSON           │  Remote end     │
//! │                 │◄────────────────────────────►│  (chromedriver, │
//! │  HttpTransport  │   POST /session/{id}/...     │   geckodriver)  │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `http` | Request building, send, response mapping |

// ============================================================================
// Submodules
// ============================================================================

/// HTTP connection to a W3C remote end.
pub mod http;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::HttpTransport;
