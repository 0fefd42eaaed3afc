//! Resilient UI - element resolution, action fallback and convergence
//! polling for WebDriver-driven UI tests.
//!
//! Real pages re-render, overlay and rename things. This library turns
//! "click the plus button of the iPhone row and check the quantity went
//! up" into one operation that survives that:
//!
//! - **Locator strategy lists**: a [`Target`] tries several selectors in
//!   order and takes the first that matches.
//! - **Resilient actions**: wait until interactable, act natively, fall back
//!   to injected script only when the native action is blocked.
//! - **Convergence polling**: re-evaluate a [`Condition`](wait::Condition)
//!   against a baseline until it holds or the timeout expires.
//!
//! # Architecture
//!
//! ```text
//! caller ──▶ Engine::operate
//!              │
//!              ├─ Resolver        (locator)  Target → ElementHandle
//!              ├─ ActionExecutor  (action)   native → script fallback
//!              └─ Poller          (wait)     Condition → PollResult
//!                     │
//!                     ▼
//!              dyn WebDriver ── W3cDriver (HTTP) | MemoryDriver (tests)
//! ```
//!
//! Nothing in the engine returns an error. Missing elements read as `None`
//! or `false`, failed actions as an [`ActionOutcome`], and waits end in
//! [`PollResult::TimedOut`](wait::PollResult) or
//! [`OperationOutcome::SoftFail`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use resilient_ui::wait::{Changed, TextProbe};
//! use resilient_ui::{
//!     Action, BrowserOptions, Engine, Result, Scope, Strategy, Target, W3cDriver, WebDriver,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let driver = W3cDriver::connect("http://localhost:4444", &BrowserOptions::default()).await?;
//!     driver.navigate("https://bstackdemo.com/").await?;
//!     let engine = Engine::new(&driver);
//!
//!     let plus = Target::new("plus", "button.increment")
//!         .or(Strategy::xpath("//button[text()='+']"))
//!         .or(Strategy::css("button").last());
//!     let count = Changed::capture(TextProbe::new(Target::new("count", ".count")), &driver).await;
//!
//!     let outcome = engine
//!         .operate(&plus, Scope::Document, &Action::Click, 1, &count, Duration::from_secs(5))
//!         .await;
//!     println!("{outcome:?}");
//!
//!     driver.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`locator`] | [`By`], [`Strategy`], [`Target`], [`Resolver`] |
//! | [`wait`] | Poller, conditions and readers |
//! | [`action`] | [`Action`], [`ActionOutcome`], the executor |
//! | [`engine`] | [`Engine`], [`EngineOptions`], [`OperationOutcome`] |
//! | [`driver`] | [`WebDriver`] trait, [`W3cDriver`], [`MemoryDriver`] |
//! | [`quantity`] | Quantity extraction rules |
//! | [`session`] | Scoped sessions with guaranteed teardown |
//! | [`storefront`] | Page objects for the demo store |
//! | [`diagnostics`] | URL, title and screenshot capture |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | W3C WebDriver wire types (internal) |
//! | [`transport`] | HTTP transport (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Actions with interactability wait and script fallback.
pub mod action;

/// Page state captured when a wait gives up.
pub mod diagnostics;

/// Browser driver abstraction and backends.
///
/// The engine only ever talks to [`WebDriver`].
pub mod driver;

/// The resolve → act → wait engine.
pub mod engine;

/// Error types and result aliases.
///
/// Driver calls return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for elements and sessions.
pub mod identifiers;

/// Locator strategy lists and resolution.
pub mod locator;

/// W3C WebDriver command and response types.
///
/// Internal module used by [`W3cDriver`].
pub mod protocol;

/// Quantity extraction from cart rows.
pub mod quantity;

/// Scoped driver sessions.
pub mod session;

/// Page objects for the demo store.
pub mod storefront;

/// HTTP transport for the W3C backend.
pub mod transport;

/// Convergence polling and conditions.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Action types
pub use action::{Action, ActionOutcome, RepeatReport};

// Driver types
pub use driver::{BrowserKind, BrowserOptions, MemoryDriver, ScriptArg, W3cDriver, WebDriver};

// Engine types
pub use engine::{Engine, EngineOptions, OperationOutcome};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ElementId, SessionId};

// Locator types
pub use locator::{By, ElementHandle, Pick, Resolver, Scope, Strategy, Target, TextMatch};

// Diagnostics
pub use diagnostics::Diagnostics;
