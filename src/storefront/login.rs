//! The sign-in modal with its custom dropdowns, and signing out.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::action::{Action, RepeatReport};
use crate::engine::{Engine, OperationOutcome};
use crate::locator::{ElementHandle, Scope};
use crate::wait::{Changed, Present, TextProbe, Visible};

use super::targets;

/// Timeout for each login step.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(6);

/// How long an opened account menu may take to show the logout control.
pub const MENU_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// LoginPage
// ============================================================================

/// Page object for the sign-in flow.
///
/// User name and password are chosen from dropdowns rather than typed.
#[derive(Debug, Clone)]
pub struct LoginPage<'d> {
    engine: Engine<'d>,
}

impl<'d> LoginPage<'d> {
    /// Creates the page object.
    #[must_use]
    pub fn new(engine: Engine<'d>) -> Self {
        Self { engine }
    }

    /// Clicks "Sign In" and waits for the user name dropdown.
    pub async fn open(&self) -> OperationOutcome<ElementHandle> {
        self.engine
            .operate(
                &targets::sign_in(),
                Scope::Document,
                &Action::Click,
                1,
                &Visible::new(targets::dropdown_control("username")),
                LOGIN_TIMEOUT,
            )
            .await
    }

    /// Selects the user name option containing `username`.
    pub async fn select_username(&self, username: &str) -> OperationOutcome<String> {
        self.select("username", username).await
    }

    /// Selects the password option containing `password`.
    pub async fn select_password(&self, password: &str) -> OperationOutcome<String> {
        self.select("password", password).await
    }

    /// Clicks the login button and waits for the signed-in user name to
    /// change from what the page showed before the click.
    pub async fn submit(&self) -> OperationOutcome<String> {
        let signed_in =
            Changed::capture(TextProbe::new(targets::signed_in_user()), self.engine.driver()).await;
        debug!(before = ?signed_in.baseline(), "Captured signed-in user");
        self.engine
            .operate(
                &targets::login_button(),
                Scope::Document,
                &Action::Click,
                1,
                &signed_in,
                LOGIN_TIMEOUT,
            )
            .await
    }

    /// Runs the whole sign-in flow.
    ///
    /// Stops at the first step that does not succeed.
    pub async fn login(&self, username: &str, password: &str) -> OperationOutcome<String> {
        if !self.open().await.is_success() {
            return OperationOutcome::fail("login form did not open");
        }
        if !self.select_username(username).await.is_success() {
            return OperationOutcome::fail(format!("user name {username:?} not selectable"));
        }
        if !self.select_password(password).await.is_success() {
            return OperationOutcome::fail("password not selectable");
        }

        let outcome = self.submit().await;
        if let Some(user) = outcome.value() {
            info!(user = %user, "Signed in");
        }
        outcome
    }

    /// Signs out and waits for a sign-in control to appear.
    ///
    /// The logout control is looked for directly, then behind the account
    /// menu, then after loading `home` if given. A page that already shows
    /// a sign-in control and no logout control counts as signed out
    /// without clicking anything.
    pub async fn logout(&self, home: Option<&str>) -> OperationOutcome<ElementHandle> {
        if let Some(outcome) = self.click_logout().await {
            return outcome;
        }

        if self.engine.is_present(&targets::user_menu()).await {
            let opened = self
                .engine
                .resolve_and_act(&targets::user_menu(), &Action::Click, 1)
                .await;
            debug!(?opened, "Opened account menu");
            self.engine
                .wait_for_condition(&Present::new(targets::logout_control()), MENU_TIMEOUT)
                .await;
            if let Some(outcome) = self.click_logout().await {
                return outcome;
            }
        }

        if let Some(home) = home {
            match self.engine.driver().navigate(home).await {
                Ok(()) => {
                    if let Some(outcome) = self.click_logout().await {
                        return outcome;
                    }
                }
                Err(e) => warn!(url = home, error = %e, "Home page did not load"),
            }
        }

        if let Some(sign_in) = self.engine.resolve(&targets::signed_out()).await {
            debug!("Already signed out");
            return OperationOutcome::Success {
                value: sign_in,
                action: RepeatReport::default(),
            };
        }
        OperationOutcome::fail("no logout control found")
    }

    /// Clicks the logout control if one resolves.
    async fn click_logout(&self) -> Option<OperationOutcome<ElementHandle>> {
        let logout = targets::logout_control();
        if !self.engine.is_present(&logout).await {
            return None;
        }
        let outcome = self
            .engine
            .operate(
                &logout,
                Scope::Document,
                &Action::Click,
                1,
                &Present::new(targets::signed_out()),
                LOGIN_TIMEOUT,
            )
            .await;
        if outcome.is_success() {
            info!("Signed out");
        }
        Some(outcome)
    }

    /// Picks the first option containing `text` in the dropdown inside
    /// `#container`. Returns the displayed value.
    async fn select(&self, container: &str, text: &str) -> OperationOutcome<String> {
        let control = targets::dropdown_control(container);
        let visible = Visible::new(control.clone());
        if self
            .engine
            .wait_for_condition(&visible, LOGIN_TIMEOUT)
            .await
            .is_timed_out()
        {
            return OperationOutcome::fail(format!("{container} dropdown not visible"));
        }

        let value = TextProbe::new(targets::dropdown_value(container));
        let selected = Changed::capture(value, self.engine.driver()).await;
        if let Some(current) = selected.baseline()
            && current.eq_ignore_ascii_case(text.trim())
        {
            debug!(container, value = %current, "Option already selected");
            return OperationOutcome::Success {
                value: current.clone(),
                action: RepeatReport::default(),
            };
        }

        let opened = self
            .engine
            .resolve_and_act(&control, &Action::Click, 1)
            .await;
        if !opened.is_performed() {
            return OperationOutcome::fail(format!("{container} dropdown did not open: {opened:?}"));
        }

        let option = targets::dropdown_option(container, text);
        let listed = Present::new(option.clone());
        if self
            .engine
            .wait_for_condition(&listed, LOGIN_TIMEOUT)
            .await
            .is_timed_out()
        {
            return OperationOutcome::fail(format!("no {container} option containing {text:?}"));
        }

        self.engine
            .operate(
                &option,
                Scope::Document,
                &Action::Click,
                1,
                &selected,
                LOGIN_TIMEOUT,
            )
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
