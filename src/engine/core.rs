//! The engine facade.
//!
//! [`Engine`] ties the resolver, the action executor and the poller to one
//! driver session. Every public operation returns a value; driver errors
//! become "absent", "not yet satisfied" or an outcome variant.
//!
//! # Operation State Machine
//!
//! ```text
//! Start → Resolve ─┬─ not found ─────────────────→ Fail
//!                  └─ found → Act (×N) → Poll ─┬─ Satisfied → Success
//!                                              └─ TimedOut  → SoftFail
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::action::{Action, ActionExecutor, ActionOutcome, RepeatReport};
use crate::diagnostics::Diagnostics;
use crate::driver::WebDriver;
use crate::error::{Error, Result};
use crate::locator::{ElementHandle, Resolver, Scope, Target};
use crate::wait::poller::duration_ms;
use crate::wait::{Condition, PollResult, Poller};

use super::options::EngineOptions;
use super::outcome::OperationOutcome;

// ============================================================================
// Engine
// ============================================================================

/// Resilient query, action and wait operations over one driver session.
///
/// The engine borrows the session; it holds no state between operations.
#[derive(Clone)]
pub struct Engine<'d> {
    driver: &'d dyn WebDriver,
    options: EngineOptions,
}

impl fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Engine - Constructors
// ============================================================================

impl<'d> Engine<'d> {
    /// Creates an engine with default options.
    #[must_use]
    pub fn new(driver: &'d dyn WebDriver) -> Self {
        Self {
            driver,
            options: EngineOptions::default(),
        }
    }

    /// Creates an engine with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options fail validation.
    pub fn with_options(driver: &'d dyn WebDriver, options: EngineOptions) -> Result<Self> {
        options.validate().map_err(Error::config)?;
        Ok(Self { driver, options })
    }

    /// Returns the driver session.
    #[inline]
    #[must_use]
    pub fn driver(&self) -> &'d dyn WebDriver {
        self.driver
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn resolver(&self) -> Resolver<'d> {
        Resolver::new(self.driver)
    }

    fn executor(&self) -> ActionExecutor<'d> {
        ActionExecutor::new(
            self.driver,
            self.options.interactable_timeout(),
            self.options.poll_interval(),
            self.options.settle_delay(),
        )
    }
}

// ============================================================================
// Engine - Queries
// ============================================================================

impl Engine<'_> {
    /// Resolves `target` in the whole document.
    pub async fn resolve(&self, target: &Target) -> Option<ElementHandle> {
        self.resolver().resolve_first(target, Scope::Document).await
    }

    /// Resolves `target` in `scope`.
    pub async fn resolve_in(&self, target: &Target, scope: Scope<'_>) -> Option<ElementHandle> {
        self.resolver().resolve_first(target, scope).await
    }

    /// Resolves every element of the first matching strategy.
    pub async fn resolve_all(&self, target: &Target, scope: Scope<'_>) -> Vec<ElementHandle> {
        self.resolver().resolve_all(target, scope).await
    }

    /// Returns `true` if `target` currently resolves.
    pub async fn is_present(&self, target: &Target) -> bool {
        self.resolve(target).await.is_some()
    }

    /// Returns the visible text of `target`, `None` if absent or unreadable.
    pub async fn read_text(&self, target: &Target) -> Option<String> {
        self.read_text_in(target, Scope::Document).await
    }

    /// Returns the visible text of `target` in `scope`.
    pub async fn read_text_in(&self, target: &Target, scope: Scope<'_>) -> Option<String> {
        let handle = self.resolve_in(target, scope).await?;
        self.text_of(&handle).await
    }

    /// Returns the visible text of a resolved element.
    pub async fn text_of(&self, handle: &ElementHandle) -> Option<String> {
        self.resolver().text_of(handle.id()).await
    }

    /// Returns an attribute of `target`, `None` if absent or unreadable.
    pub async fn read_attribute(&self, target: &Target, name: &str) -> Option<String> {
        let handle = self.resolve(target).await?;
        match self.driver.attribute(handle.id(), name).await {
            Ok(value) => value,
            Err(e) => {
                debug!(name = %target, attribute = name, error = %e, "Attribute read failed");
                None
            }
        }
    }

    /// Captures URL, title and (if enabled) a screenshot.
    pub async fn diagnostics(&self) -> Diagnostics {
        Diagnostics::capture(self.driver, self.options.capture_screenshots).await
    }
}

// ============================================================================
// Engine - Actions
// ============================================================================

impl Engine<'_> {
    /// Performs `action` once on an already resolved element.
    pub async fn act(&self, handle: &ElementHandle, action: &Action) -> ActionOutcome {
        self.executor().perform(handle.id(), action).await
    }

    /// Resolves `target` in the document and performs `action` `times`
    /// times. A `times` of zero is treated as one.
    pub async fn resolve_and_act(&self, target: &Target, action: &Action, times: u32) -> ActionOutcome {
        self.resolve_and_act_in(target, Scope::Document, action, times)
            .await
    }

    /// Resolves `target` in `scope` and performs `action` `times` times.
    pub async fn resolve_and_act_in(
        &self,
        target: &Target,
        scope: Scope<'_>,
        action: &Action,
        times: u32,
    ) -> ActionOutcome {
        match self.act_repeated(target, scope, action, times).await {
            Some(report) => report.overall(),
            None => ActionOutcome::NotFound,
        }
    }

    async fn act_repeated(
        &self,
        target: &Target,
        scope: Scope<'_>,
        action: &Action,
        times: u32,
    ) -> Option<RepeatReport> {
        let Some(first) = self.resolve_in(target, scope).await else {
            debug!(name = %target, action = %action, "Target not found, nothing to act on");
            return None;
        };
        Some(
            self.executor()
                .perform_repeated(target, scope, first, action, times.max(1))
                .await,
        )
    }
}

// ============================================================================
// Engine - Waits
// ============================================================================

impl Engine<'_> {
    /// Polls `condition` until satisfied or `timeout` elapses.
    ///
    /// On timeout the page URL and title are logged.
    pub async fn wait_for_condition<C: Condition>(
        &self,
        condition: &C,
        timeout: Duration,
    ) -> PollResult<C::Value> {
        let result = self.poll(condition, timeout).await;
        if result.is_timed_out() {
            let diagnostics = Diagnostics::capture(self.driver, false).await;
            warn!(
                condition = %condition.describe(),
                timeout_ms = duration_ms(timeout),
                %diagnostics,
                "Wait timed out"
            );
        }
        result
    }

    /// [`Engine::wait_for_condition`] with the default timeout.
    pub async fn wait_for<C: Condition>(&self, condition: &C) -> PollResult<C::Value> {
        self.wait_for_condition(condition, self.options.timeout())
            .await
    }

    /// Runs one complete operation: resolve `target`, perform `action`
    /// `times` times, then wait up to `timeout` for `condition`.
    ///
    /// Any baseline the condition compares against must be captured
    /// before calling this. The condition is first evaluated after the
    /// last action attempt.
    pub async fn operate<C: Condition>(
        &self,
        target: &Target,
        scope: Scope<'_>,
        action: &Action,
        times: u32,
        condition: &C,
        timeout: Duration,
    ) -> OperationOutcome<C::Value> {
        let Some(report) = self.act_repeated(target, scope, action, times).await else {
            return OperationOutcome::fail(format!("{target} not found"));
        };

        match self.poll(condition, timeout).await {
            PollResult::Satisfied(value) => {
                debug!(
                    name = %target,
                    condition = %condition.describe(),
                    attempts = report.len(),
                    "Operation confirmed"
                );
                OperationOutcome::Success {
                    value,
                    action: report,
                }
            }
            PollResult::TimedOut(last_observed) => {
                let diagnostics = self.diagnostics().await;
                warn!(
                    name = %target,
                    condition = %condition.describe(),
                    outcome = ?report.overall(),
                    %diagnostics,
                    "Operation not confirmed before timeout"
                );
                OperationOutcome::SoftFail {
                    last_observed,
                    action: report,
                    diagnostics,
                }
            }
        }
    }

    async fn poll<C: Condition>(&self, condition: &C, timeout: Duration) -> PollResult<C::Value> {
        let driver = self.driver;
        debug!(condition = %condition.describe(), timeout_ms = duration_ms(timeout), "Waiting");
        Poller::new(timeout, self.options.poll_interval())
            .poll(|| condition.evaluate(driver))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
