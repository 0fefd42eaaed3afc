//! Quantity extraction from a cart item.
//!
//! Rules are tried in priority order and the first one that yields a
//! number wins:
//!
//! | Rule | Reads |
//! |------|-------|
//! | [`QuantityRule::Labeled`] | `Quantity: 3` anywhere in the item text |
//! | [`QuantityRule::Scoped`] | digits of the first matching sub-element |
//! | [`QuantityRule::Loose`] | the first standalone number in the item text |
//!
//! `None` means no rule produced a number.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, trace};

use crate::driver::WebDriver;
use crate::error::Result;
use crate::identifiers::ElementId;
use crate::locator::{By, Resolver, Scope, Target};
use crate::wait::Probe;

// ============================================================================
// Patterns
// ============================================================================

static LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)quantity[:\s]*(\d+)").expect("labeled quantity pattern is valid")
});

static LOOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b").expect("loose number pattern is valid"));

// ============================================================================
// Parsers
// ============================================================================

/// Parses the number following a `Quantity` label.
#[must_use]
pub fn parse_labeled(text: &str) -> Option<u32> {
    LABELED.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Strips every non-digit and parses the rest.
#[must_use]
pub fn parse_digits(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Parses the first standalone number.
#[must_use]
pub fn parse_loose(text: &str) -> Option<u32> {
    LOOSE.captures(text)?.get(1)?.as_str().parse().ok()
}

// ============================================================================
// QuantityRule
// ============================================================================

/// One way of reading a quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityRule {
    /// Number after a `Quantity` label in the item text.
    Labeled,
    /// Digits of the first sub-element matched by any selector, in order.
    Scoped(Vec<By>),
    /// First standalone number in the item text.
    Loose,
}

impl QuantityRule {
    /// Rule name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Labeled => "labeled",
            Self::Scoped(_) => "scoped",
            Self::Loose => "loose",
        }
    }

    /// Selectors tried by the scoped rule, most specific first.
    #[must_use]
    pub fn default_scoped() -> Self {
        Self::Scoped(vec![
            By::css(".shelf-item__quantity"),
            By::css(".quantity"),
            By::css(".qty"),
            By::css(".shelf-item__details small"),
        ])
    }
}

// ============================================================================
// QuantityExtractor
// ============================================================================

/// Ordered list of [`QuantityRule`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityExtractor {
    rules: Vec<QuantityRule>,
}

impl Default for QuantityExtractor {
    fn default() -> Self {
        Self {
            rules: vec![
                QuantityRule::Labeled,
                QuantityRule::default_scoped(),
                QuantityRule::Loose,
            ],
        }
    }
}

impl QuantityExtractor {
    /// Creates an extractor with custom rules.
    #[must_use]
    pub fn new(rules: Vec<QuantityRule>) -> Self {
        Self { rules }
    }

    /// Returns the rules in priority order.
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[QuantityRule] {
        &self.rules
    }

    /// Reads the quantity shown inside `item`.
    pub async fn extract(&self, driver: &dyn WebDriver, item: &ElementId) -> Option<u32> {
        let text = driver
            .text(item)
            .await
            .inspect_err(|e| trace!(element = %item, error = %e, "Item text unreadable"))
            .unwrap_or_default();

        for rule in &self.rules {
            let found = match rule {
                QuantityRule::Labeled => parse_labeled(&text),
                QuantityRule::Scoped(selectors) => scoped(driver, item, selectors).await,
                QuantityRule::Loose => parse_loose(&text),
            };
            if let Some(quantity) = found {
                debug!(element = %item, rule = rule.name(), quantity, "Quantity parsed");
                return Some(quantity);
            }
        }

        debug!(element = %item, "No quantity found");
        None
    }
}

async fn scoped(driver: &dyn WebDriver, item: &ElementId, selectors: &[By]) -> Option<u32> {
    for by in selectors {
        let Ok(elements) = driver.find_elements(Some(item), by).await else {
            continue;
        };
        for element in &elements {
            if let Ok(text) = driver.text(element).await
                && let Some(quantity) = parse_digits(&text)
            {
                return Some(quantity);
            }
        }
    }
    None
}

// ============================================================================
// QuantityProbe
// ============================================================================

/// Reads the quantity of the item `item` resolves to.
///
/// The item is resolved afresh on every read.
#[derive(Debug, Clone)]
pub struct QuantityProbe {
    item: Target,
    extractor: QuantityExtractor,
}

impl QuantityProbe {
    /// Creates a reader with the default rules.
    #[must_use]
    pub fn new(item: Target) -> Self {
        Self {
            item,
            extractor: QuantityExtractor::default(),
        }
    }

    /// Replaces the extraction rules.
    #[must_use]
    pub fn with_extractor(mut self, extractor: QuantityExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}

#[async_trait]
impl Probe for QuantityProbe {
    type Output = u32;

    fn describe(&self) -> String {
        format!("quantity of {}", self.item)
    }

    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<u32>> {
        let Some(item) = Resolver::new(driver)
            .resolve_first(&self.item, Scope::Document)
            .await
        else {
            return Ok(None);
        };
        Ok(self.extractor.extract(driver, item.id()).await)
    }
}

// ============================================================================
// Tests
// ============================================================================
