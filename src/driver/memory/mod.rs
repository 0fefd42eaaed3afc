//! Scripted in-memory DOM backend.
//!
//! [`MemoryDriver`] implements [`WebDriver`] over a [`Dom`] the test builds
//! by hand. Click handlers can change the DOM immediately or schedule a
//! change for later, which models asynchronous re-renders. Deferred
//! changes use `tokio::time`, so paused-clock tests are deterministic.
//!
//! # Interaction Rules
//!
//! | Node state | Native click / keys | Script click |
//! |------------|---------------------|--------------|
//! | Detached | `StaleElement` | `StaleElement` |
//! | Hidden (self or ancestor) | `NotInteractable` | handler runs |
//! | Disabled | `NotInteractable` | no effect |
//! | Obscured | `ClickIntercepted` (click only) | handler runs |
//!
//! # Example
//!
//! ```
//! use resilient_ui::driver::{Dom, MemoryDriver, Node};
//!
//! let mut dom = Dom::new();
//! let root = dom.root();
//! dom.append(root, Node::new("div").with_class("float-cart").with_text("Cart"));
//! let driver = MemoryDriver::from_dom(dom);
//! assert_eq!(driver.native_clicks(), 0);
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod css;
mod dom;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tracing::trace;

use crate::action::{APPEND_VALUE_SCRIPT, CLICK_SCRIPT, SET_VALUE_SCRIPT};
use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::locator::By;

use super::{ScriptArg, WebDriver};

use self::dom::Deferred;

// ============================================================================
// Re-exports
// ============================================================================

pub use dom::{ClickContext, ClickHandler, Dom, Node, NodeId};

// ============================================================================
// Constants
// ============================================================================

/// Bytes returned by `screenshot_png` (PNG signature).
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// ============================================================================
// State
// ============================================================================

/// Rebuilds the document when the driver navigates.
type Loader = Box<dyn FnMut(&str, &mut Dom) + Send>;

struct State {
    dom: Dom,
    deferred: Vec<Deferred>,
    loader: Option<Loader>,
    url: String,
    title: String,
    quit: bool,
    native_clicks: usize,
    script_clicks: usize,
}

impl State {
    /// Applies every deferred mutation whose due time has passed, oldest
    /// first.
    fn flush(&mut self) {
        let now = Instant::now();
        if self.deferred.iter().all(|d| d.due > now) {
            return;
        }
        self.deferred.sort_by_key(|d| d.due);
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|d| d.due <= now);
        self.deferred = pending;
        for deferred in due {
            (deferred.apply)(&mut self.dom);
        }
    }

    fn attached(&self, element: &ElementId) -> Result<NodeId> {
        let node = self
            .dom
            .lookup(element)
            .ok_or_else(|| Error::element_not_found(format!("element reference {element}")))?;
        if !self.dom.is_attached(node) {
            return Err(Error::stale_element(element.clone()));
        }
        Ok(node)
    }

    fn interactable(&self, element: &ElementId) -> Result<NodeId> {
        let node = self.attached(element)?;
        if !self.dom.is_displayed(node) {
            return Err(Error::not_interactable(element.clone(), "element is not displayed"));
        }
        if !self.dom.node(node).is_enabled() {
            return Err(Error::not_interactable(element.clone(), "element is disabled"));
        }
        Ok(node)
    }

    fn dispatch_click(&mut self, node: NodeId) {
        if let Some(handler) = self.dom.record_click(node) {
            let mut ctx = ClickContext {
                dom: &mut self.dom,
                node,
                now: Instant::now(),
                deferred: &mut self.deferred,
                url: &mut self.url,
            };
            handler(&mut ctx);
        }
    }
}

// ============================================================================
// MemoryDriver
// ============================================================================

/// In-memory [`WebDriver`] for offline tests and benchmarks.
pub struct MemoryDriver {
    state: Mutex<State>,
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryDriver")
            .field("url", &state.url)
            .field("quit", &state.quit)
            .field("native_clicks", &state.native_clicks)
            .field("script_clicks", &state.script_clicks)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::from_dom(Dom::new())
    }
}

// ============================================================================
// MemoryDriver - Constructors
// ============================================================================

impl MemoryDriver {
    /// Creates a driver with an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a driver serving `dom`.
    #[must_use]
    pub fn from_dom(dom: Dom) -> Self {
        Self {
            state: Mutex::new(State {
                dom,
                deferred: Vec::new(),
                loader: None,
                url: "about:blank".to_string(),
                title: String::new(),
                quit: false,
                native_clicks: 0,
                script_clicks: 0,
            }),
        }
    }

    /// Sets the URL and title reported by the driver.
    #[must_use]
    pub fn with_location(self, url: impl Into<String>, title: impl Into<String>) -> Self {
        self.set_location(url, title);
        self
    }

    /// Runs `loader` on every [`WebDriver::navigate`] with the new URL.
    ///
    /// Without a loader, navigation only changes the reported URL.
    #[must_use]
    pub fn on_navigate<F>(self, loader: F) -> Self
    where
        F: FnMut(&str, &mut Dom) + Send + 'static,
    {
        self.state.lock().loader = Some(Box::new(loader));
        self
    }
}

// ============================================================================
// MemoryDriver - Scripting
// ============================================================================

impl MemoryDriver {
    /// Runs `f` against the document after applying due mutations.
    pub fn dom<R>(&self, f: impl FnOnce(&mut Dom) -> R) -> R {
        let mut state = self.state.lock();
        state.flush();
        f(&mut state.dom)
    }

    /// Schedules a document mutation `delay` from now.
    pub fn schedule<F>(&self, delay: Duration, apply: F)
    where
        F: FnOnce(&mut Dom) + Send + 'static,
    {
        self.state.lock().deferred.push(Deferred {
            due: Instant::now() + delay,
            apply: Box::new(apply),
        });
    }

    /// Changes the URL and title reported by the driver.
    pub fn set_location(&self, url: impl Into<String>, title: impl Into<String>) {
        let mut state = self.state.lock();
        state.url = url.into();
        state.title = title.into();
    }

    /// Returns the number of native clicks that reached a node.
    #[must_use]
    pub fn native_clicks(&self) -> usize {
        self.state.lock().native_clicks
    }

    /// Returns the number of script clicks that reached a node.
    #[must_use]
    pub fn script_clicks(&self) -> usize {
        self.state.lock().script_clicks
    }

    /// Returns `true` once `quit` has been called.
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.state.lock().quit
    }

    /// Locks the state for one driver call.
    fn call<R>(&self, op: &'static str, f: impl FnOnce(&mut State) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock();
        if state.quit {
            return Err(Error::session("session has been deleted"));
        }
        state.flush();
        trace!(op, "Memory driver call");
        f(&mut state)
    }
}

// ============================================================================
// WebDriver Implementation
// ============================================================================

#[async_trait]
impl WebDriver for MemoryDriver {
    async fn find_elements(&self, parent: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        self.call("find_elements", |state| {
            let scope = parent.map(|p| state.attached(p)).transpose()?;
            let nodes = state.dom.find(scope, by)?;
            Ok(nodes
                .into_iter()
                .map(|n| state.dom.element_id(n).clone())
                .collect())
        })
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.call("click", |state| {
            let node = state.interactable(element)?;
            if state.dom.node(node).is_obscured() {
                return Err(Error::click_intercepted(
                    element.clone(),
                    "another element would receive the click",
                ));
            }
            state.native_clicks += 1;
            state.dispatch_click(node);
            Ok(())
        })
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.call("send_keys", |state| {
            let node = state.interactable(element)?;
            let value = format!("{}{text}", state.dom.node(node).value());
            state.dom.node_mut(node).set_value(value);
            Ok(())
        })
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.call("clear", |state| {
            let node = state.interactable(element)?;
            state.dom.node_mut(node).set_value("");
            Ok(())
        })
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.call("text", |state| {
            let node = state.attached(element)?;
            Ok(state.dom.visible_text(node))
        })
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        self.call("attribute", |state| {
            let node = state.dom.node(state.attached(element)?);
            Ok(node
                .attribute(name)
                .or_else(|| (name == "value").then(|| node.value().to_string())))
        })
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.call("is_displayed", |state| {
            let node = state.attached(element)?;
            Ok(state.dom.is_displayed(node))
        })
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.call("is_enabled", |state| {
            let node = state.attached(element)?;
            Ok(state.dom.node(node).is_enabled())
        })
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        self.call("is_selected", |state| {
            let node = state.attached(element)?;
            Ok(state.dom.node(node).is_selected())
        })
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value> {
        self.call("execute_script", |state| {
            let target = match args.first() {
                Some(ScriptArg::Element(id)) => state.attached(id)?,
                _ => return Err(Error::script_error("first argument must be an element")),
            };
            let text = match args.get(1) {
                Some(ScriptArg::Value(Value::String(s))) => s.as_str(),
                _ => "",
            };

            match script {
                CLICK_SCRIPT => {
                    if state.dom.node(target).is_enabled() {
                        state.script_clicks += 1;
                        state.dispatch_click(target);
                    }
                }
                SET_VALUE_SCRIPT => state.dom.node_mut(target).set_value(text),
                APPEND_VALUE_SCRIPT => {
                    let value = format!("{}{text}", state.dom.node(target).value());
                    state.dom.node_mut(target).set_value(value);
                }
                _ => return Err(Error::script_error(format!("unsupported script: {script}"))),
            }
            Ok(Value::Null)
        })
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.call("navigate", |state| {
            state.deferred.clear();
            state.url = url.to_string();
            if let Some(loader) = state.loader.as_mut() {
                loader(url, &mut state.dom);
            }
            Ok(())
        })
    }

    async fn current_url(&self) -> Result<String> {
        self.call("current_url", |state| Ok(state.url.clone()))
    }

    async fn title(&self) -> Result<String> {
        self.call("title", |state| Ok(state.title.clone()))
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.call("screenshot_png", |_| Ok(PNG_SIGNATURE.to_vec()))
    }

    async fn quit(&self) -> Result<()> {
        self.call("quit", |state| {
            state.quit = true;
            Ok(())
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn button_page(node: Node) -> (MemoryDriver, ElementId, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut dom = Dom::new();
        let root = dom.root();
        let button = dom.append(
            root,
            node.on_click(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let id = dom.element_id(button).clone();
        (MemoryDriver::from_dom(dom), id, hits)
    }

    #[tokio::test]
    async fn test_native_click_runs_handler() {
        let (driver, id, hits) = button_page(Node::new("button"));
        driver.click(&id).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(driver.native_clicks(), 1);
        assert_eq!(driver.script_clicks(), 0);
    }

    #[tokio::test]
    async fn test_hidden_element_not_interactable_but_script_click_works() {
        let (driver, id, hits) = button_page(Node::new("button").hidden());
        let err = driver.click(&id).await.unwrap_err();
        assert!(matches!(err, Error::NotInteractable { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        driver
            .execute_script(CLICK_SCRIPT, vec![ScriptArg::Element(id)])
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(driver.script_clicks(), 1);
    }

    #[tokio::test]
    async fn test_obscured_click_intercepted() {
        let (driver, id, _) = button_page(Node::new("button").obscured());
        let err = driver.click(&id).await.unwrap_err();
        assert!(matches!(err, Error::ClickIntercepted { .. }));
        assert_eq!(driver.native_clicks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_mutation_applies_after_delay() {
        let mut dom = Dom::new();
        let root = dom.root();
        let label = dom.append(root, Node::new("span").with_text("1"));
        let label_id = dom.element_id(label).clone();
        let button = dom.append(
            root,
            Node::new("button").on_click(move |ctx| {
                ctx.after(Duration::from_millis(700), move |dom| dom.set_text(label, "2"));
            }),
        );
        let button_id = dom.element_id(button).clone();
        let driver = MemoryDriver::from_dom(dom);

        driver.click(&button_id).await.unwrap();
        assert_eq!(driver.text(&label_id).await.unwrap(), "1");

        tokio::time::advance(Duration::from_millis(700)).await;
        assert_eq!(driver.text(&label_id).await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_click_handler_can_navigate() {
        let mut dom = Dom::new();
        let root = dom.root();
        let link = dom.append(
            root,
            Node::new("a").on_click(|ctx| ctx.navigate("https://shop.test/confirmation")),
        );
        let link_id = dom.element_id(link).clone();
        let driver = MemoryDriver::from_dom(dom).with_location("https://shop.test/checkout", "Shop");

        driver.click(&link_id).await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://shop.test/confirmation");
        assert_eq!(driver.title().await.unwrap(), "Shop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_runs_loader_and_drops_pending_mutations() {
        let mut dom = Dom::new();
        let root = dom.root();
        let banner = dom.append(root, Node::new("p").with_text("old"));
        let banner_id = dom.element_id(banner).clone();
        let driver = MemoryDriver::from_dom(dom).on_navigate(move |url, dom| {
            dom.set_text(banner, format!("loaded {url}"));
        });
        driver.schedule(Duration::from_millis(100), move |dom| dom.set_text(banner, "late"));

        driver.navigate("https://shop.test/").await.unwrap();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(driver.current_url().await.unwrap(), "https://shop.test/");
        assert_eq!(driver.text(&banner_id).await.unwrap(), "loaded https://shop.test/");
    }

    #[tokio::test]
    async fn test_replaced_node_is_stale() {
        let (driver, id, _) = button_page(Node::new("button"));
        driver.dom(|dom| {
            let node = dom.lookup(&id).unwrap();
            dom.replace(node, Node::new("button"));
        });
        assert!(driver.click(&id).await.unwrap_err().is_stale());
        assert!(driver.text(&id).await.unwrap_err().is_stale());
    }

    #[tokio::test]
    async fn test_send_keys_appends_and_clear_resets() {
        let (driver, id, _) = button_page(Node::new("input").with_value("ab"));
        driver.send_keys(&id, "cd").await.unwrap();
        assert_eq!(driver.attribute(&id, "value").await.unwrap().as_deref(), Some("abcd"));
        driver.clear(&id).await.unwrap();
        assert_eq!(driver.attribute(&id, "value").await.unwrap().as_deref(), Some(""));

        driver
            .execute_script(SET_VALUE_SCRIPT, vec![id.clone().into(), "xyz".into()])
            .await
            .unwrap();
        assert_eq!(driver.attribute(&id, "value").await.unwrap().as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_unknown_script_is_script_error() {
        let (driver, id, _) = button_page(Node::new("button"));
        let err = driver
            .execute_script("return 1;", vec![id.into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ScriptError { .. }));
    }

    #[tokio::test]
    async fn test_quit_ends_session() {
        let driver = MemoryDriver::new().with_location("https://shop.test/", "Shop");
        assert_eq!(driver.title().await.unwrap(), "Shop");
        driver.quit().await.unwrap();
        assert!(driver.is_quit());
        assert!(matches!(
            driver.current_url().await.unwrap_err(),
            Error::Session { .. }
        ));
    }

    #[tokio::test]
    async fn test_scoped_find_uses_parent() {
        let mut dom = Dom::new();
        let root = dom.root();
        let a = dom.append(root, Node::new("div").with_class("item"));
        dom.append(a, Node::new("button").with_text("+"));
        let b = dom.append(root, Node::new("div").with_class("item"));
        let b_button = dom.append(b, Node::new("button").with_text("+"));
        let b_id = dom.element_id(b).clone();
        let expected = dom.element_id(b_button).clone();
        let driver = MemoryDriver::from_dom(dom);

        let found = driver
            .find_elements(Some(&b_id), &By::css("button"))
            .await
            .unwrap();
        assert_eq!(found, vec![expected]);
        assert_eq!(driver.find_elements(None, &By::css("button")).await.unwrap().len(), 2);
    }
}
