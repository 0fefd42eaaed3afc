//! Header search, vendor filters and sort order.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::action::{Action, ActionOutcome, RepeatReport};
use crate::driver::WebDriver;
use crate::engine::{Engine, OperationOutcome};
use crate::error::Result;
use crate::locator::{Resolver, Scope, Target};
use crate::wait::{AttributeProbe, Probe, Satisfies};

use super::targets;

/// How long a filter or sort change may take to show.
pub const FILTER_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Readers
// ============================================================================

/// Whether a vendor filter is on: its checkbox is selected or its label
/// is marked active.
#[derive(Debug, Clone)]
struct VendorSelected {
    label: Target,
}

#[async_trait]
impl Probe for VendorSelected {
    type Output = bool;

    fn describe(&self) -> String {
        format!("{} selected", self.label)
    }

    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<bool>> {
        let resolver = Resolver::new(driver);
        let Some(label) = resolver.resolve_first(&self.label, Scope::Document).await else {
            return Ok(None);
        };
        if let Some(input) = resolver
            .resolve_first(&targets::filter_checkbox(), Scope::Within(&label))
            .await
            && driver.is_selected(input.id()).await?
        {
            return Ok(Some(true));
        }
        let class = driver.attribute(label.id(), "class").await?;
        Ok(Some(
            class.is_some_and(|c| c.to_lowercase().contains("active")),
        ))
    }
}

/// Text of the selected sort option.
#[derive(Debug, Clone, Copy)]
struct SelectedSortOrder;

#[async_trait]
impl Probe for SelectedSortOrder {
    type Output = String;

    fn describe(&self) -> String {
        "selected sort order".to_string()
    }

    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<String>> {
        let resolver = Resolver::new(driver);
        let Some(select) = resolver
            .resolve_first(&targets::sort_select(), Scope::Document)
            .await
        else {
            return Ok(None);
        };
        for option in resolver
            .resolve_all(&targets::sort_options(), Scope::Within(&select))
            .await
        {
            if driver.is_selected(option.id()).await? {
                let text = driver.text(option.id()).await?;
                return Ok(Some(text.trim().to_string()));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// SearchPage
// ============================================================================

/// Page object for the header search box and the result filters.
#[derive(Debug, Clone)]
pub struct SearchPage<'d> {
    engine: Engine<'d>,
}

impl<'d> SearchPage<'d> {
    /// Creates the page object.
    #[must_use]
    pub fn new(engine: Engine<'d>) -> Self {
        Self { engine }
    }

    /// Replaces the search box content and waits until it reads back.
    ///
    /// Blank text fails without touching the page.
    pub async fn enter_search(&self, text: &str) -> OperationOutcome<String> {
        if text.trim().is_empty() {
            return OperationOutcome::fail("nothing to search for");
        }
        let reads_back = Satisfies::equals(
            AttributeProbe::new(targets::search_box(), "value"),
            text.to_string(),
        );
        self.engine
            .operate(
                &targets::search_box(),
                Scope::Document,
                &Action::Replace(text.to_string()),
                1,
                &reads_back,
                FILTER_TIMEOUT,
            )
            .await
    }

    /// Returns the search box content.
    pub async fn search_text(&self) -> Option<String> {
        self.engine
            .read_attribute(&targets::search_box(), "value")
            .await
    }

    /// Clicks the search button.
    pub async fn submit_search(&self) -> ActionOutcome {
        self.engine
            .resolve_and_act(&targets::search_button(), &Action::Click, 1)
            .await
    }

    /// Returns every product title in the result list, in display order.
    pub async fn product_titles(&self) -> Vec<String> {
        let mut titles = Vec::new();
        for title in self
            .engine
            .resolve_all(&targets::result_titles(), Scope::Document)
            .await
        {
            if let Some(text) = self.engine.text_of(&title).await {
                titles.push(text.trim().to_string());
            }
        }
        titles
    }

    /// Turns on the filter for `vendor` and waits for it to show as on.
    ///
    /// A filter that is already on is left alone.
    pub async fn apply_vendor_filter(&self, vendor: &str) -> OperationOutcome<bool> {
        let label = targets::vendor_filter(vendor);
        let selected = VendorSelected {
            label: label.clone(),
        };
        match selected.read(self.engine.driver()).await {
            Ok(None) | Err(_) => {
                return OperationOutcome::fail(format!("no filter for vendor {vendor:?}"));
            }
            Ok(Some(true)) => {
                debug!(vendor, "Vendor filter already on");
                return OperationOutcome::Success {
                    value: true,
                    action: RepeatReport::default(),
                };
            }
            Ok(Some(false)) => {}
        }

        let outcome = self
            .engine
            .operate(
                &label,
                Scope::Document,
                &Action::Click,
                1,
                &Satisfies::equals(selected, true),
                FILTER_TIMEOUT,
            )
            .await;
        if outcome.is_success() {
            info!(vendor, "Vendor filter applied");
        }
        outcome
    }

    /// Returns `true` if the filter for `vendor` is on.
    pub async fn is_vendor_selected(&self, vendor: &str) -> bool {
        let selected = VendorSelected {
            label: targets::vendor_filter(vendor),
        };
        matches!(selected.read(self.engine.driver()).await, Ok(Some(true)))
    }

    /// Picks the sort option whose text is `order`, ignoring case, and
    /// waits for it to show as selected.
    pub async fn select_sort_order(&self, order: &str) -> OperationOutcome<String> {
        let Some(select) = self.engine.resolve(&targets::sort_select()).await else {
            return OperationOutcome::fail("no sort control");
        };
        if let Some(current) = self.current_sort_order().await
            && current.eq_ignore_ascii_case(order.trim())
        {
            debug!(order = %current, "Sort order already selected");
            return OperationOutcome::Success {
                value: current,
                action: RepeatReport::default(),
            };
        }

        let wanted = order.trim().to_string();
        let sorted = Satisfies::new(SelectedSortOrder, format!("is {wanted:?}"), move |v: &String| {
            v.eq_ignore_ascii_case(&wanted)
        });
        let outcome = self
            .engine
            .operate(
                &targets::sort_option(order),
                Scope::Within(&select),
                &Action::Click,
                1,
                &sorted,
                FILTER_TIMEOUT,
            )
            .await;
        if let OperationOutcome::Success { value, .. } = &outcome {
            info!(order = %value, "Sort order selected");
        }
        outcome
    }

    /// Returns the text of the selected sort option.
    pub async fn current_sort_order(&self) -> Option<String> {
        SelectedSortOrder
            .read(self.engine.driver())
            .await
            .ok()
            .flatten()
    }

    /// Returns `true` if the sort control shows `order`.
    ///
    /// Without a selected option the control's text is searched instead.
    pub async fn is_sorted_by(&self, order: &str) -> bool {
        match self.current_sort_order().await {
            Some(current) => current.eq_ignore_ascii_case(order.trim()),
            None => self
                .engine
                .read_text(&targets::sort_select())
                .await
                .is_some_and(|t| t.to_lowercase().contains(&order.trim().to_lowercase())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
