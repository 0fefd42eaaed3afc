//! The shipping step of checkout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::{Action, RepeatReport};
use crate::engine::{Engine, OperationOutcome};
use crate::locator::{ElementHandle, Scope};
use crate::wait::{AnyOf, Downloaded, Matched, Present, UrlContains, Visible};

use super::targets;

/// How long the order confirmation may take.
pub const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(8);

/// How long the receipt download may take.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Path segment of the confirmation page.
const CONFIRMATION_PATH: &str = "/confirmation";

/// What proved the order went through: the confirmation URL, or a
/// confirmation element on the page.
pub type Confirmation = Matched<String, ElementHandle>;

/// Shipping form values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// First address line.
    pub address: String,
    /// State or province.
    pub province: String,
    /// Postal code.
    pub postal_code: String,
}

impl ShippingDetails {
    /// Fields in form order: element id, label, value.
    fn fields(&self) -> [(&'static str, &'static str, &str); 5] {
        [
            ("firstNameInput", "First Name", self.first_name.as_str()),
            ("lastNameInput", "Last Name", self.last_name.as_str()),
            ("addressLine1Input", "Address", self.address.as_str()),
            ("provinceInput", "State/Province", self.province.as_str()),
            ("postCodeInput", "Postal Code", self.postal_code.as_str()),
        ]
    }
}

/// Page object for the shipping form.
#[derive(Debug, Clone)]
pub struct CheckoutPage<'d> {
    engine: Engine<'d>,
}

impl<'d> CheckoutPage<'d> {
    /// Creates the page object.
    #[must_use]
    pub fn new(engine: Engine<'d>) -> Self {
        Self { engine }
    }

    /// Waits for the shipping form.
    pub async fn wait_for_form(&self) -> bool {
        self.engine
            .wait_for_condition(&Visible::new(targets::checkout_form()), CHECKOUT_TIMEOUT)
            .await
            .is_satisfied()
    }

    /// Replaces every shipping field's content.
    ///
    /// The report holds one entry per field, in form order.
    pub async fn fill_shipping(&self, details: &ShippingDetails) -> RepeatReport {
        self.wait_for_form().await;
        let mut report = RepeatReport::default();
        for (id, label, value) in details.fields() {
            let outcome = self
                .engine
                .resolve_and_act(
                    &targets::shipping_input(id, label),
                    &Action::Replace(value.to_string()),
                    1,
                )
                .await;
            debug!(field = label, ?outcome, "Shipping field filled");
            report.attempts.push(outcome);
        }
        report
    }

    /// Submits the form and waits for the order confirmation.
    ///
    /// Either signal confirms: a URL containing `/confirmation`, or the
    /// receipt link (or confirmation message) being present.
    pub async fn submit(&self) -> OperationOutcome<Confirmation> {
        self.wait_for_form().await;
        let confirmed = AnyOf::new(
            UrlContains::new(CONFIRMATION_PATH),
            Present::new(targets::order_confirmation()),
        );
        let outcome = self
            .engine
            .operate(
                &targets::shipping_submit(),
                Scope::Document,
                &Action::Click,
                1,
                &confirmed,
                CHECKOUT_TIMEOUT,
            )
            .await;
        if let OperationOutcome::Success { value, .. } = &outcome {
            match value {
                Matched::First(url) => info!(url = %url, "Order confirmed"),
                Matched::Second(element) => info!(element = %element.target(), "Order confirmed"),
            }
        }
        outcome
    }

    /// Clicks the receipt link and waits for a new PDF in `download_dir`.
    ///
    /// `download_dir` must be the directory the browser was started with.
    pub async fn download_receipt(&self, download_dir: &Path) -> OperationOutcome<PathBuf> {
        let downloaded = match Downloaded::capture(download_dir, "pdf") {
            Ok(condition) => condition,
            Err(e) => return OperationOutcome::fail(format!("download directory unreadable: {e}")),
        };
        self.engine
            .operate(
                &targets::download_pdf(),
                Scope::Document,
                &Action::Click,
                1,
                &downloaded,
                DOWNLOAD_TIMEOUT,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::action::ActionOutcome;
    use crate::driver::{ClickContext, Dom, MemoryDriver, Node, NodeId, WebDriver};

    /// The shipping form; `on_submit` runs when the submit button is clicked.
    fn form<F>(on_submit: F) -> (MemoryDriver, Vec<NodeId>)
    where
        F: Fn(&mut ClickContext<'_>) + Send + Sync + 'static,
    {
        let mut dom = Dom::new();
        let root = dom.root();
        let form = dom.append(root, Node::new("div").with_class("checkout-form"));
        let inputs: Vec<NodeId> = [
            "firstNameInput",
            "lastNameInput",
            "addressLine1Input",
            "provinceInput",
            "postCodeInput",
        ]
        .into_iter()
        .map(|id| dom.append(form, Node::new("input").with_id(id).with_value("stale")))
        .collect();
        dom.append(
            form,
            Node::new("button")
                .with_attr("type", "submit")
                .with_text("Submit")
                .on_click(on_submit),
        );
        let driver = MemoryDriver::from_dom(dom).with_location("https://shop.test/checkout", "Shop");
        (driver, inputs)
    }

    fn shows_after(id: &'static str) -> impl Fn(&mut ClickContext<'_>) + Send + Sync + 'static {
        move |ctx| {
            ctx.after(Duration::from_millis(500), move |dom| {
                let root = dom.root();
                dom.append(root, Node::new("a").with_id(id).with_text("Download order receipt"));
            });
        }
    }

    fn details() -> ShippingDetails {
        serde_json::from_str(
            r#"{
                "first_name": "Ada",
                "last_name": "Lovelace",
                "address": "12 St James Square",
                "province": "London",
                "postal_code": "SW1Y 4JH"
            }"#,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_replaces_values() {
        let (driver, inputs) = form(|_| {});
        let page = CheckoutPage::new(Engine::new(&driver));

        let report = page.fill_shipping(&details()).await;
        assert_eq!(report.len(), 5);
        assert_eq!(report.overall(), ActionOutcome::Performed);

        let values: Vec<String> =
            driver.dom(|dom| inputs.iter().map(|&n| dom.node(n).value().to_string()).collect());
        assert_eq!(
            values,
            ["Ada", "Lovelace", "12 St James Square", "London", "SW1Y 4JH"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_field_uses_script_fallback() {
        let (driver, inputs) = form(|_| {});
        driver.dom(|dom| dom.node_mut(inputs[3]).set_enabled(false));
        let page = CheckoutPage::new(Engine::new(&driver));

        let report = page.fill_shipping(&details()).await;
        assert_eq!(report.attempts[3], ActionOutcome::PerformedViaFallback);
        assert_eq!(report.fallback_count(), 1);
        assert_eq!(driver.dom(|dom| dom.node(inputs[3]).value().to_string()), "London");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_confirmed_by_url() {
        let (driver, _) = form(|ctx| ctx.navigate("https://shop.test/confirmation"));
        let page = CheckoutPage::new(Engine::new(&driver));

        let outcome = page.submit().await;
        assert_eq!(
            outcome.value(),
            Some(&Matched::First("https://shop.test/confirmation".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_confirmed_by_receipt_link() {
        let (driver, _) = form(shows_after("downloadpdf"));
        let page = CheckoutPage::new(Engine::new(&driver));

        let outcome = page.submit().await;
        let Some(Matched::Second(element)) = outcome.value() else {
            panic!("expected the receipt link to confirm, got {outcome:?}");
        };
        assert_eq!(element.target(), "order-confirmation");
        assert_eq!(driver.current_url().await.unwrap(), "https://shop.test/checkout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_confirmed_by_message() {
        let (driver, _) = form(shows_after("confirmation-message"));
        let page = CheckoutPage::new(Engine::new(&driver));
        assert!(matches!(page.submit().await.value(), Some(Matched::Second(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_without_confirmation_is_soft_fail() {
        let (driver, _) = form(|_| {});
        let page = CheckoutPage::new(Engine::new(&driver));

        let start = Instant::now();
        let outcome = page.submit().await;
        assert!(outcome.is_soft_fail());
        assert!(start.elapsed() >= CHECKOUT_TIMEOUT);
        let OperationOutcome::SoftFail { last_observed, .. } = outcome else {
            unreachable!();
        };
        assert_eq!(
            last_observed,
            Some(Matched::First("https://shop.test/checkout".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_receipt_waits_for_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let receipt = dir.path().join("receipt.pdf");
        let written = receipt.clone();

        let mut dom = Dom::new();
        let root = dom.root();
        dom.append(
            root,
            Node::new("a").with_id("downloadpdf").on_click(move |_| {
                std::fs::write(&written, b"%PDF-1.4").unwrap();
            }),
        );
        let driver = MemoryDriver::from_dom(dom);
        let page = CheckoutPage::new(Engine::new(&driver));

        let outcome = page.download_receipt(dir.path()).await;
        assert_eq!(outcome.value(), Some(&receipt));
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_without_file_is_soft_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append(root, Node::new("a").with_id("downloadpdf"));
        let driver = MemoryDriver::from_dom(dom);
        let page = CheckoutPage::new(Engine::new(&driver));

        assert!(page.download_receipt(dir.path()).await.is_soft_fail());
        assert!(page.download_receipt(&dir.path().join("missing")).await.is_soft_fail());
    }
}
