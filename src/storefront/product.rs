//! The product shelf.

use std::time::Duration;

use tracing::{debug, info};

use crate::action::Action;
use crate::engine::{Engine, OperationOutcome};
use crate::locator::{ElementHandle, Scope};
use crate::quantity::QuantityProbe;
use crate::wait::{Changed, ChangedWithFallback, CountProbe, DualObservation};

use super::targets;

/// How long an added product may take to show up in the cart.
pub const ADD_TIMEOUT: Duration = Duration::from_secs(8);

/// Row quantity (primary) and matching row count (secondary) after an add.
pub type AddObservation = DualObservation<u32, usize>;

/// Page object for the product shelf.
#[derive(Debug, Clone)]
pub struct ProductPage<'d> {
    engine: Engine<'d>,
}

impl<'d> ProductPage<'d> {
    /// Creates the page object.
    #[must_use]
    pub fn new(engine: Engine<'d>) -> Self {
        Self { engine }
    }

    /// Returns every product title on the shelf.
    pub async fn product_titles(&self) -> Vec<String> {
        let title = targets::product_title();
        let mut titles = Vec::new();
        for card in self
            .engine
            .resolve_all(&targets::product_cards(), Scope::Document)
            .await
        {
            if let Some(text) = self.engine.read_text_in(&title, Scope::Within(&card)).await {
                titles.push(text.trim().to_string());
            }
        }
        debug!(count = titles.len(), "Read product titles");
        titles
    }

    /// Adds the first product on the shelf and waits for the cart to
    /// show one more of it.
    pub async fn add_first_to_cart(&self) -> OperationOutcome<AddObservation> {
        let Some(card) = self.engine.resolve(&targets::product_cards()).await else {
            return OperationOutcome::fail("no products on the shelf");
        };
        let Some(title) = self
            .engine
            .read_text_in(&targets::product_title(), Scope::Within(&card))
            .await
        else {
            return OperationOutcome::fail("first product has no title");
        };
        self.add(&card, title.trim()).await
    }

    /// Adds the first product whose title contains `name`, ignoring case,
    /// and waits for the cart to show one more of it.
    ///
    /// The cart row's quantity must grow past what it showed before the
    /// click. A row without a readable quantity is confirmed by the number
    /// of matching rows growing instead. Re-adding a product whose row
    /// does not change is a [`OperationOutcome::SoftFail`].
    pub async fn add_to_cart_by_name(&self, name: &str) -> OperationOutcome<AddObservation> {
        let Some(card) = self.engine.resolve(&targets::product_card(name)).await else {
            return OperationOutcome::fail(format!("no product matching {name:?}"));
        };
        self.add(&card, name.trim()).await
    }

    async fn add(&self, card: &ElementHandle, name: &str) -> OperationOutcome<AddObservation> {
        let driver = self.engine.driver();
        let row = targets::cart_item(name);
        let added = ChangedWithFallback::new(
            Changed::capture(QuantityProbe::new(row.clone()), driver)
                .await
                .increasing(),
            Changed::capture(CountProbe::new(row), driver)
                .await
                .increasing(),
        );
        debug!(
            product = name,
            quantity = ?added.primary_baseline(),
            rows = ?added.secondary_baseline(),
            "Captured cart baseline"
        );

        let outcome = self
            .engine
            .operate(
                &targets::buy_button(),
                Scope::Within(card),
                &Action::Click,
                1,
                &added,
                ADD_TIMEOUT,
            )
            .await;
        if let OperationOutcome::Success { value, .. } = &outcome {
            info!(product = name, quantity = ?value.primary, via = ?value.via, "Added to cart");
        }
        outcome
    }
}
