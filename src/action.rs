//! Resilient action execution.
//!
//! Each attempt first waits for the element to be displayed and enabled,
//! then performs the native interaction. If that fails because the element
//! is blocked (not interactable, click intercepted, wait timed out), the
//! same interaction is performed through injected script against the same
//! element.
//!
//! | Native failure | Result |
//! |----------------|--------|
//! | none | [`ActionOutcome::Performed`] |
//! | blocked, script succeeds | [`ActionOutcome::PerformedViaFallback`] |
//! | stale or missing | [`ActionOutcome::NotFound`] |
//! | blocked, script fails | [`ActionOutcome::NotInteractable`] |
//!
//! The executor only reports the action step. Whether the action had the
//! intended effect is decided by a condition afterwards.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::driver::{ScriptArg, WebDriver};
use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::locator::{ElementHandle, Resolver, Scope, Target};
use crate::wait::poller::duration_ms;
use crate::wait::{Observation, PollResult, Poller};

// ============================================================================
// Scripts
// ============================================================================

/// Script fallback for clicks.
pub const CLICK_SCRIPT: &str = "arguments[0].click();";

/// Script fallback for replacing a form value.
pub const SET_VALUE_SCRIPT: &str = "arguments[0].value = arguments[1]; \
     arguments[0].dispatchEvent(new Event('input', { bubbles: true })); \
     arguments[0].dispatchEvent(new Event('change', { bubbles: true }));";

/// Script fallback for typing.
pub const APPEND_VALUE_SCRIPT: &str = "arguments[0].value += arguments[1]; \
     arguments[0].dispatchEvent(new Event('input', { bubbles: true })); \
     arguments[0].dispatchEvent(new Event('change', { bubbles: true }));";

// ============================================================================
// Action
// ============================================================================

/// An interaction with one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Action {
    /// Click.
    Click,
    /// Type text after the current value.
    Type(String),
    /// Clear the value.
    Clear,
    /// Clear, then type.
    Replace(String),
}

impl Action {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Type(_) => "type",
            Self::Clear => "clear",
            Self::Replace(_) => "replace",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// ActionOutcome
// ============================================================================

/// Result of the action step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Native interaction succeeded.
    Performed,
    /// Native interaction failed; script fallback succeeded.
    PerformedViaFallback,
    /// The element could not be resolved or went stale.
    NotFound,
    /// Both native interaction and fallback failed.
    NotInteractable,
}

impl ActionOutcome {
    /// Returns `true` for either performed variant.
    #[inline]
    #[must_use]
    pub fn is_performed(self) -> bool {
        matches!(self, Self::Performed | Self::PerformedViaFallback)
    }
}

// ============================================================================
// RepeatReport
// ============================================================================

/// Per-attempt outcomes of a repeated action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatReport {
    /// One outcome per attempt, in order.
    pub attempts: Vec<ActionOutcome>,
}

impl RepeatReport {
    /// Number of attempts made.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// Returns `true` if no attempt was made.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Number of attempts performed natively.
    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.count(ActionOutcome::Performed)
    }

    /// Number of attempts performed through the script fallback.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.count(ActionOutcome::PerformedViaFallback)
    }

    /// Folds the attempts into one outcome.
    ///
    /// The first failed attempt wins; otherwise `PerformedViaFallback` if
    /// any attempt needed the fallback. An empty report is `NotFound`.
    #[must_use]
    pub fn overall(&self) -> ActionOutcome {
        if let Some(failed) = self.attempts.iter().find(|o| !o.is_performed()) {
            return *failed;
        }
        if self.attempts.is_empty() {
            ActionOutcome::NotFound
        } else if self.fallback_count() > 0 {
            ActionOutcome::PerformedViaFallback
        } else {
            ActionOutcome::Performed
        }
    }

    fn count(&self, outcome: ActionOutcome) -> usize {
        self.attempts.iter().filter(|o| **o == outcome).count()
    }
}

// ============================================================================
// ActionExecutor
// ============================================================================

/// Performs actions with interactability wait and script fallback.
#[derive(Clone, Copy)]
pub struct ActionExecutor<'d> {
    driver: &'d dyn WebDriver,
    interactable: Poller,
    settle_delay: Duration,
}

impl<'d> ActionExecutor<'d> {
    /// Creates an executor.
    #[must_use]
    pub fn new(
        driver: &'d dyn WebDriver,
        interactable_timeout: Duration,
        poll_interval: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            driver,
            interactable: Poller::new(interactable_timeout, poll_interval),
            settle_delay,
        }
    }

    /// Performs `action` once on `element`.
    pub async fn perform(&self, element: &ElementId, action: &Action) -> ActionOutcome {
        let native = match self.wait_interactable(element).await {
            Ok(()) => self.native(element, action).await,
            Err(e) => Err(e),
        };

        let err = match native {
            Ok(()) => {
                debug!(element = %element, action = %action, "Action performed");
                return ActionOutcome::Performed;
            }
            Err(e) => e,
        };

        if is_gone(&err) {
            debug!(element = %element, action = %action, error = %err, "Element gone before action");
            return ActionOutcome::NotFound;
        }
        if !err.is_interaction_blocked() {
            warn!(element = %element, action = %action, error = %err, "Action failed");
            return ActionOutcome::NotInteractable;
        }

        warn!(
            element = %element,
            action = %action,
            error = %err,
            "Native action blocked, using script fallback"
        );
        match self.scripted(element, action).await {
            Ok(()) => ActionOutcome::PerformedViaFallback,
            Err(e) if is_gone(&e) => ActionOutcome::NotFound,
            Err(e) => {
                warn!(element = %element, action = %action, error = %e, "Script fallback failed");
                ActionOutcome::NotInteractable
            }
        }
    }

    /// Performs `action` exactly `times` times.
    ///
    /// `first` is used for the first attempt; later attempts re-resolve
    /// `target` in `scope` because the page may have re-rendered. Attempts
    /// are never cut short, and the settle delay separates consecutive
    /// attempts.
    pub async fn perform_repeated(
        &self,
        target: &Target,
        scope: Scope<'_>,
        first: ElementHandle,
        action: &Action,
        times: u32,
    ) -> RepeatReport {
        let resolver = Resolver::new(self.driver);
        let mut report = RepeatReport::default();
        let mut next = Some(first);

        for attempt in 0..times {
            if attempt > 0 {
                sleep(self.settle_delay).await;
                next = resolver.resolve_first(target, scope).await;
            }
            let outcome = match next.take() {
                Some(handle) => self.perform(handle.id(), action).await,
                None => ActionOutcome::NotFound,
            };
            debug!(name = %target, attempt, ?outcome, "Action attempt finished");
            report.attempts.push(outcome);
        }
        report
    }

    async fn wait_interactable(&self, element: &ElementId) -> Result<()> {
        let driver = self.driver;
        let result = self
            .interactable
            .poll(|| async move {
                let state = async {
                    Ok::<_, Error>(
                        driver.is_displayed(element).await? && driver.is_enabled(element).await?,
                    )
                }
                .await;
                match state {
                    Ok(true) => Ok(Observation::Met(true)),
                    Ok(false) => Ok(Observation::Unmet(None)),
                    // Gone for good, stop waiting.
                    Err(e) if is_gone(&e) => Ok(Observation::Met(false)),
                    Err(e) => Err(e),
                }
            })
            .await;

        match result {
            PollResult::Satisfied(true) => Ok(()),
            PollResult::Satisfied(false) => Err(Error::stale_element(element.clone())),
            PollResult::TimedOut(_) => Err(Error::timeout(
                format!("wait for {element} to be interactable"),
                duration_ms(self.interactable.timeout()),
            )),
        }
    }

    async fn native(&self, element: &ElementId, action: &Action) -> Result<()> {
        match action {
            Action::Click => self.driver.click(element).await,
            Action::Type(text) => self.driver.send_keys(element, text).await,
            Action::Clear => self.driver.clear(element).await,
            Action::Replace(text) => {
                self.driver.clear(element).await?;
                self.driver.send_keys(element, text).await
            }
        }
    }

    async fn scripted(&self, element: &ElementId, action: &Action) -> Result<()> {
        let (script, value) = match action {
            Action::Click => (CLICK_SCRIPT, None),
            Action::Type(text) => (APPEND_VALUE_SCRIPT, Some(text.as_str())),
            Action::Clear => (SET_VALUE_SCRIPT, Some("")),
            Action::Replace(text) => (SET_VALUE_SCRIPT, Some(text.as_str())),
        };

        let mut args = vec![ScriptArg::Element(element.clone())];
        if let Some(value) = value {
            args.push(ScriptArg::Value(Value::String(value.to_string())));
        }
        self.driver.execute_script(script, args).await?;
        Ok(())
    }
}

fn is_gone(err: &Error) -> bool {
    matches!(
        err,
        Error::StaleElement { .. } | Error::ElementNotFound { .. }
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Dom, MemoryDriver, Node, NodeId};

    fn executor(driver: &MemoryDriver) -> ActionExecutor<'_> {
        ActionExecutor::new(
            driver,
            Duration::from_secs(5),
            Duration::from_millis(250),
            Duration::from_millis(200),
        )
    }

    fn single(node: Node) -> (MemoryDriver, NodeId, ElementId) {
        let mut dom = Dom::new();
        let root = dom.root();
        let id = dom.append(root, node);
        let element = dom.element_id(id).clone();
        (MemoryDriver::from_dom(dom), id, element)
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_click_is_primary() {
        let (driver, node, element) = single(Node::new("button"));
        let outcome = executor(&driver).perform(&element, &Action::Click).await;
        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(driver.native_clicks(), 1);
        assert_eq!(driver.script_clicks(), 0);
        assert_eq!(driver.dom(|dom| dom.clicks(node)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_intercepted_click_falls_back_once() {
        let (driver, node, element) = single(Node::new("button").obscured());
        let outcome = executor(&driver).perform(&element, &Action::Click).await;
        assert_eq!(outcome, ActionOutcome::PerformedViaFallback);
        assert_eq!(driver.native_clicks(), 0);
        assert_eq!(driver.script_clicks(), 1);
        assert_eq!(driver.dom(|dom| dom.clicks(node)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_element_waits_then_falls_back() {
        let (driver, _, element) = single(Node::new("button").hidden());
        let start = tokio::time::Instant::now();
        let outcome = executor(&driver).perform(&element, &Action::Click).await;
        assert_eq!(outcome, ActionOutcome::PerformedViaFallback);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_becoming_visible_is_primary() {
        let (driver, node, element) = single(Node::new("button").hidden());
        driver.schedule(Duration::from_millis(600), move |dom| {
            dom.node_mut(node).set_displayed(true);
        });
        let outcome = executor(&driver).perform(&element, &Action::Click).await;
        assert_eq!(outcome, ActionOutcome::Performed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_element_is_not_found_without_fallback() {
        let (driver, node, element) = single(Node::new("button"));
        driver.dom(|dom| dom.remove(node));
        let start = tokio::time::Instant::now();
        let outcome = executor(&driver).perform(&element, &Action::Click).await;
        assert_eq!(outcome, ActionOutcome::NotFound);
        assert_eq!(driver.script_clicks(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_on_disabled_input_uses_script() {
        let (driver, node, element) = single(Node::new("input").with_value("old").disabled());
        let outcome = executor(&driver)
            .perform(&element, &Action::Replace("new".to_string()))
            .await;
        assert_eq!(outcome, ActionOutcome::PerformedViaFallback);
        assert_eq!(driver.dom(|dom| dom.node(node).value().to_string()), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_click_exactly_n_with_settle_delay() {
        let (driver, _, _) = single(Node::new("button").with_class("plus"));
        let target = Target::new("plus", "button.plus");
        let resolver = Resolver::new(&driver);
        let first = resolver.resolve_first(&target, Scope::Document).await.unwrap();

        let start = tokio::time::Instant::now();
        let report = executor(&driver)
            .perform_repeated(&target, Scope::Document, first, &Action::Click, 3)
            .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.primary_count(), 3);
        assert_eq!(report.overall(), ActionOutcome::Performed);
        assert_eq!(driver.native_clicks(), 3);
        // Two pauses between three attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[test]
    fn test_report_overall() {
        let mixed = RepeatReport {
            attempts: vec![ActionOutcome::Performed, ActionOutcome::PerformedViaFallback],
        };
        assert_eq!(mixed.overall(), ActionOutcome::PerformedViaFallback);
        assert_eq!(mixed.fallback_count(), 1);

        let failed = RepeatReport {
            attempts: vec![ActionOutcome::Performed, ActionOutcome::NotInteractable],
        };
        assert_eq!(failed.overall(), ActionOutcome::NotInteractable);
        assert_eq!(RepeatReport::default().overall(), ActionOutcome::NotFound);
    }
}
