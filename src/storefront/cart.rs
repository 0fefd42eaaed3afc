//! The floating cart.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{debug, info};

use crate::action::Action;
use crate::engine::{Engine, OperationOutcome};
use crate::locator::Scope;
use crate::quantity::QuantityProbe;
use crate::wait::{
    Absent, Changed, ChangedWithFallback, DualObservation, Present, Probe, TextProbe, Visible,
};

use super::targets;

// ============================================================================
// Constants
// ============================================================================

/// How long an increase may take to show up.
pub const INCREASE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a removed row may take to disappear.
pub const REMOVE_TIMEOUT: Duration = Duration::from_secs(6);

/// Quantity (primary) and subtotal (secondary) reads after an increase.
pub type QuantityObservation = DualObservation<u32, String>;

// ============================================================================
// CartPage
// ============================================================================

/// Page object for the floating cart.
#[derive(Debug, Clone)]
pub struct CartPage<'d> {
    engine: Engine<'d>,
}

impl<'d> CartPage<'d> {
    /// Creates the page object.
    #[must_use]
    pub fn new(engine: Engine<'d>) -> Self {
        Self { engine }
    }

    /// Waits for the cart panel to be visible.
    pub async fn wait_until_visible(&self) -> bool {
        self.engine
            .wait_for(&Visible::new(targets::cart_root()))
            .await
            .is_satisfied()
    }

    /// Waits for at least one row.
    pub async fn wait_for_items(&self) -> bool {
        self.engine
            .wait_for(&Present::new(targets::cart_items()))
            .await
            .is_satisfied()
    }

    /// Returns `true` if the cart is visible and holds at least one row.
    pub async fn is_open(&self) -> bool {
        self.wait_until_visible().await
            && !self
                .engine
                .resolve_all(&targets::cart_items(), Scope::Document)
                .await
                .is_empty()
    }

    /// Returns the title of every row, in display order.
    pub async fn item_names(&self) -> Vec<String> {
        self.wait_until_visible().await;
        let title = targets::cart_item_title();
        let mut names = Vec::new();
        for item in self
            .engine
            .resolve_all(&targets::cart_items(), Scope::Document)
            .await
        {
            let text = match self.engine.read_text_in(&title, Scope::Within(&item)).await {
                Some(text) => Some(text),
                None => self.engine.text_of(&item).await,
            };
            if let Some(text) = text {
                names.push(text.trim().to_string());
            }
        }
        names
    }

    /// Returns `true` if a row title contains `name`, ignoring case.
    pub async fn is_item_present(&self, name: &str) -> bool {
        self.wait_for_items().await;
        let needle = name.to_lowercase();
        self.item_names()
            .await
            .iter()
            .any(|n| n.to_lowercase().contains(&needle))
    }

    /// Reads the quantity of the first row whose title contains `name`.
    pub async fn quantity_for_item(&self, name: &str) -> Option<u32> {
        self.wait_until_visible().await;
        QuantityProbe::new(targets::cart_item(name))
            .read(self.engine.driver())
            .await
            .ok()
            .flatten()
    }

    /// Returns the subtotal text.
    pub async fn subtotal(&self) -> Option<String> {
        self.engine
            .read_text(&targets::subtotal())
            .await
            .map(|s| s.trim().to_string())
    }

    /// Clicks the row's "+" control `times` times and waits for the
    /// quantity to grow.
    ///
    /// If the row shows no quantity before or after, a subtotal change is
    /// accepted instead. An increase that cannot be observed in time is a
    /// [`OperationOutcome::SoftFail`].
    pub async fn increase_quantity(
        &self,
        name: &str,
        times: u32,
    ) -> OperationOutcome<QuantityObservation> {
        self.wait_until_visible().await;
        let row = targets::cart_item(name);
        let Some(item) = self.engine.resolve(&row).await else {
            return OperationOutcome::fail(format!("cart item containing {name:?} not found"));
        };

        let driver = self.engine.driver();
        let quantity = Changed::capture(QuantityProbe::new(row), driver)
            .await
            .increasing();
        let subtotal = Changed::capture(TextProbe::new(targets::subtotal()), driver).await;
        debug!(
            item = name,
            quantity = ?quantity.baseline(),
            subtotal = ?subtotal.baseline(),
            "Captured cart baseline"
        );

        let outcome = self
            .engine
            .operate(
                &targets::plus_control(),
                Scope::Within(&item),
                &Action::Click,
                times,
                &ChangedWithFallback::new(quantity, subtotal),
                INCREASE_TIMEOUT,
            )
            .await;
        if let OperationOutcome::Success { value, .. } = &outcome {
            info!(item = name, times, via = ?value.via, "Quantity increase confirmed");
        }
        outcome
    }

    /// Clicks the row's remove control and waits for the row to disappear.
    pub async fn remove_item(&self, name: &str) -> OperationOutcome<()> {
        self.wait_until_visible().await;
        let Some(item) = self.engine.resolve(&targets::cart_item(name)).await else {
            return OperationOutcome::fail(format!("cart item containing {name:?} not found"));
        };

        let title = match self
            .engine
            .read_text_in(&targets::cart_item_title(), Scope::Within(&item))
            .await
        {
            Some(title) => title,
            None => self.engine.text_of(&item).await.unwrap_or_default(),
        };
        let gone = Absent::new(targets::cart_item_titled(&title));

        let outcome = self
            .engine
            .operate(
                &targets::remove_control(),
                Scope::Within(&item),
                &Action::Click,
                1,
                &gone,
                REMOVE_TIMEOUT,
            )
            .await;
        if outcome.is_success() {
            info!(item = %title.trim(), "Cart item removed");
        }
        outcome
    }

    /// Returns every row's text, each under a separator line.
    pub async fn raw_text(&self) -> String {
        self.wait_for_items().await;
        let mut out = String::new();
        for item in self
            .engine
            .resolve_all(&targets::cart_items(), Scope::Document)
            .await
        {
            out.push_str("---- ITEM ----\n");
            out.push_str(&self.engine.text_of(&item).await.unwrap_or_default());
            out.push('\n');
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::action::ActionOutcome;
    use crate::driver::{Dom, MemoryDriver, Node, NodeId};
    use crate::quantity::{parse_digits, parse_labeled};
    use crate::wait::Signal;

    struct Row {
        qty: NodeId,
        plus: NodeId,
    }

    /// A cart with one row per `(title, quantity label)`; "+" bumps the
    /// quantity and adds $4.00 to the subtotal after `delay`.
    fn cart(rows: &[(&str, &str)], delay: Duration) -> (MemoryDriver, Vec<Row>) {
        let mut dom = Dom::new();
        let root = dom.root();
        let panel = dom.append(root, Node::new("div").with_class("float-cart"));
        let subtotal = dom.append(
            root,
            Node::new("p").with_class("sub-price__val").with_text("$10.00"),
        );

        let mut out = Vec::new();
        for &(title, qty_label) in rows {
            let item = dom.append(panel, Node::new("div").with_class("shelf-item"));
            let details = dom.append(item, Node::new("div").with_class("shelf-item__details"));
            dom.append(details, Node::new("p").with_class("title").with_text(title));
            let qty = dom.append(details, Node::new("p").with_class("desc").with_text(qty_label));
            dom.append(
                item,
                Node::new("div").with_class("shelf-item__del").on_click(move |ctx| {
                    ctx.after(Duration::from_millis(300), move |dom| dom.remove(item));
                }),
            );
            dom.append(
                item,
                Node::new("button")
                    .with_class("change-product-button")
                    .with_text("-"),
            );
            let plus = dom.append(
                item,
                Node::new("button")
                    .with_class("change-product-button")
                    .with_text("+")
                    .on_click(move |ctx| ctx.after(delay, move |dom| bump(dom, qty, subtotal))),
            );
            out.push(Row { qty, plus });
        }
        (MemoryDriver::from_dom(dom), out)
    }

    fn bump(dom: &mut Dom, qty: NodeId, subtotal: NodeId) {
        if let Some(n) = parse_labeled(dom.node(qty).text()) {
            dom.set_text(qty, format!("Quantity: {}", n + 1));
        }
        let cents = parse_digits(dom.node(subtotal).text()).unwrap_or(0) + 400;
        dom.set_text(subtotal, format!("${}.{:02}", cents / 100, cents % 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_names_and_presence() {
        let (driver, _) = cart(
            &[("iPhone 12", "Quantity: 1"), ("Galaxy S20", "Quantity: 2")],
            Duration::ZERO,
        );
        let page = CartPage::new(Engine::new(&driver));

        assert!(page.is_open().await);
        assert_eq!(page.item_names().await, vec!["iPhone 12", "Galaxy S20"]);
        assert!(page.is_item_present("galaxy").await);
        assert!(!page.is_item_present("pixel").await);
        assert_eq!(page.quantity_for_item("s20").await, Some(2));
        assert_eq!(page.subtotal().await.as_deref(), Some("$10.00"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_increase_confirmed_by_quantity() {
        let (driver, rows) = cart(&[("iPhone 12", "Quantity: 2")], Duration::ZERO);
        let page = CartPage::new(Engine::new(&driver));

        let outcome = page.increase_quantity("iphone", 2).await;
        let OperationOutcome::Success { value, action } = outcome else {
            panic!("expected confirmed increase");
        };
        assert_eq!(value.via, Some(Signal::Primary));
        assert_eq!(value.primary, Some(4));
        assert_eq!(action.primary_count(), 2);
        assert_eq!(driver.dom(|dom| dom.clicks(rows[0].plus)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_increase_confirmed_by_subtotal_without_quantity() {
        let (driver, rows) = cart(&[("Pixel Buds", "")], Duration::from_millis(300));
        let page = CartPage::new(Engine::new(&driver));
        assert_eq!(page.quantity_for_item("pixel").await, None);

        let outcome = page.increase_quantity("pixel", 1).await;
        let value = outcome.value().unwrap();
        assert_eq!(value.via, Some(Signal::Secondary));
        assert_eq!(value.secondary.as_deref(), Some("$14.00"));
        assert!(driver.dom(|dom| dom.node(rows[0].qty).text().is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_increase_without_effect_is_soft_fail() {
        let (driver, rows) = cart(&[("iPhone 12", "Quantity: 2")], Duration::from_secs(60));
        let page = CartPage::new(Engine::new(&driver));

        let start = Instant::now();
        let outcome = page.increase_quantity("iphone", 1).await;
        assert!(start.elapsed() >= INCREASE_TIMEOUT);
        assert!(outcome.is_soft_fail());
        assert!(outcome.was_attempted());
        assert_eq!(driver.dom(|dom| dom.clicks(rows[0].plus)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_increase_missing_item_fails() {
        let (driver, _) = cart(&[("iPhone 12", "Quantity: 2")], Duration::ZERO);
        let page = CartPage::new(Engine::new(&driver));
        let outcome = page.increase_quantity("galaxy", 1).await;
        assert!(outcome.is_fail());
        assert_eq!(driver.native_clicks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_waits_for_disappearance() {
        let (driver, _) = cart(
            &[("iPhone 12", "Quantity: 1"), ("iPhone 12 Mini", "Quantity: 1")],
            Duration::ZERO,
        );
        let page = CartPage::new(Engine::new(&driver));

        let outcome = page.remove_item("iphone 12").await;
        assert!(outcome.is_success());
        assert_eq!(outcome.report().unwrap().overall(), ActionOutcome::Performed);
        assert_eq!(page.item_names().await, vec!["iPhone 12 Mini"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_text_lists_rows() {
        let (driver, _) = cart(&[("iPhone 12", "Quantity: 1")], Duration::ZERO);
        let page = CartPage::new(Engine::new(&driver));
        let raw = page.raw_text().await;
        assert!(raw.starts_with("---- ITEM ----\niPhone 12\nQuantity: 1"));
    }
}
