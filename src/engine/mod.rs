//! The resolve → act → wait engine.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Engine`] | Queries, actions and waits over one session |
//! | [`EngineOptions`] | Timeouts, poll interval and settle delay |
//! | [`OperationOutcome`] | `Success`, `SoftFail` or `Fail` |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use resilient_ui::wait::{Changed, TextProbe};
//! use resilient_ui::{Action, Engine, Scope, Target, W3cDriver, BrowserOptions, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = W3cDriver::connect("http://localhost:4444", &BrowserOptions::default()).await?;
//! let engine = Engine::new(&driver);
//!
//! let plus = Target::new("plus", "div.float-cart button.change-product-button");
//! let qty = TextProbe::new(Target::new("quantity", ".shelf-item__details .desc"));
//! let changed = Changed::capture(qty, &driver).await;
//!
//! let outcome = engine
//!     .operate(&plus, Scope::Document, &Action::Click, 1, &changed, Duration::from_secs(5))
//!     .await;
//! println!("confirmed: {}", outcome.is_success());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Engine facade.
pub mod core;

/// Engine configuration.
pub mod options;

/// Operation results.
pub mod outcome;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Engine;
pub use options::EngineOptions;
pub use outcome::OperationOutcome;
