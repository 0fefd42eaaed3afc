//! Browser driver abstraction.
//!
//! The engine consumes the browser only through the [`WebDriver`] trait.
//! Two backends ship with the crate:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`W3cDriver`] | W3C WebDriver session (geckodriver, chromedriver) |
//! | [`MemoryDriver`] | Scripted in-memory DOM for offline tests |
//! | [`BrowserOptions`] | Browser launch options for new sessions |
//!
//! # Example
//!
//! ```no_run
//! use resilient_ui::{BrowserOptions, W3cDriver, WebDriver, Result};
//!
//! # async fn example() -> Result<()> {
//! let options = BrowserOptions::chrome().with_headless();
//! let driver = W3cDriver::connect("http://localhost:9515", &options).await?;
//!
//! driver.navigate("https://bstackdemo.com/").await?;
//! let title = driver.title().await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Scripted in-memory DOM backend.
pub mod memory;

/// Browser launch options and capabilities.
pub mod options;

/// W3C WebDriver session backend.
pub mod w3c;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::ElementId;
use crate::locator::By;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{ClickContext, Dom, MemoryDriver, Node, NodeId};
pub use options::{BrowserKind, BrowserOptions};
pub use w3c::W3cDriver;

// ============================================================================
// ScriptArg
// ============================================================================

/// Argument passed to an injected script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// A live element, available as `arguments[i]` in the script.
    Element(ElementId),
    /// A plain JSON value.
    Value(Value),
}

impl From<ElementId> for ScriptArg {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<&str> for ScriptArg {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_string()))
    }
}

// ============================================================================
// WebDriver Trait
// ============================================================================

/// Narrow browser-automation interface consumed by the engine.
///
/// Every method is a single round trip. Implementations report W3C-style
/// failures through [`crate::Error`]; the engine decides which of those are
/// fatal.
#[async_trait]
pub trait WebDriver: Send + Sync {
    /// Finds all elements matching `by`, in document order.
    ///
    /// With `parent` set, only descendants of that element are returned.
    async fn find_elements(&self, parent: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>>;

    /// Clicks an element using native input.
    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Types text into an element.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()>;

    /// Clears an editable element.
    async fn clear(&self, element: &ElementId) -> Result<()>;

    /// Returns the element's visible text.
    async fn text(&self, element: &ElementId) -> Result<String>;

    /// Returns an attribute value, `None` if the attribute is absent.
    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>>;

    /// Returns `true` if the element is rendered.
    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    /// Returns `true` if the element is not disabled.
    async fn is_enabled(&self, element: &ElementId) -> Result<bool>;

    /// Returns `true` if a checkbox, radio button or option is selected.
    async fn is_selected(&self, element: &ElementId) -> Result<bool>;

    /// Executes synchronous JavaScript with the given arguments.
    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value>;

    /// Loads `url` in the current window and waits for the page load.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the current page URL.
    async fn current_url(&self) -> Result<String>;

    /// Returns the current page title.
    async fn title(&self) -> Result<String>;

    /// Captures the viewport as PNG bytes.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// Ends the session.
    async fn quit(&self) -> Result<()>;
}

// ============================================================================
// Shared Sessions
// ============================================================================

#[async_trait]
impl<T: WebDriver + ?Sized> WebDriver for Arc<T> {
    async fn find_elements(&self, parent: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        (**self).find_elements(parent, by).await
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        (**self).click(element).await
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        (**self).send_keys(element, text).await
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        (**self).clear(element).await
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        (**self).text(element).await
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        (**self).attribute(element, name).await
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        (**self).is_displayed(element).await
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        (**self).is_enabled(element).await
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        (**self).is_selected(element).await
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value> {
        (**self).execute_script(script, args).await
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        (**self).navigate(url).await
    }

    async fn current_url(&self) -> Result<String> {
        (**self).current_url().await
    }

    async fn title(&self) -> Result<String> {
        (**self).title().await
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        (**self).screenshot_png().await
    }

    async fn quit(&self) -> Result<()> {
        (**self).quit().await
    }
}
