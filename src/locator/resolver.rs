//! Strategy-list resolution.
//!
//! The resolver walks a [`Target`]'s strategies in declared order and
//! returns the first non-empty result. Every driver failure during
//! resolution (invalid selector, stale scope, lost element) counts as "this
//! strategy found nothing", so resolution itself never fails.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace};

use crate::driver::WebDriver;
use crate::identifiers::ElementId;

use super::strategy::{Strategy, TextMatch};
use super::target::Target;

// ============================================================================
// Types
// ============================================================================

/// Where a target is searched.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// The whole document.
    Document,
    /// Below a previously resolved element.
    Within(&'a ElementHandle),
}

/// A resolved element plus where it was found.
///
/// Handles are only valid for the operation that produced them; the page
/// can re-render at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: ElementId,
    scope: Option<ElementId>,
    target: String,
    strategy: usize,
}

impl ElementHandle {
    /// Returns the driver element reference.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Returns the scope element, `None` for document-wide matches.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Option<&ElementId> {
        self.scope.as_ref()
    }

    /// Returns the name of the target this handle was resolved for.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the index of the strategy that matched.
    #[inline]
    #[must_use]
    pub fn strategy_index(&self) -> usize {
        self.strategy
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves targets against a driver. Pure read.
#[derive(Clone, Copy)]
pub struct Resolver<'d> {
    driver: &'d dyn WebDriver,
}

impl<'d> Resolver<'d> {
    /// Creates a resolver over `driver`.
    #[inline]
    #[must_use]
    pub fn new(driver: &'d dyn WebDriver) -> Self {
        Self { driver }
    }

    /// Returns every element of the first strategy that matches anything.
    ///
    /// Empty if no strategy matches.
    pub async fn resolve_all(&self, target: &Target, scope: Scope<'_>) -> Vec<ElementHandle> {
        let parent = match scope {
            Scope::Document => None,
            Scope::Within(handle) => Some(handle.id()),
        };

        for (index, strategy) in target.strategies().iter().enumerate() {
            let search_root = if strategy.within_scope { parent } else { None };
            let ids = self.run(strategy, search_root).await;
            if ids.is_empty() {
                trace!(name = %target, strategy = index, by = %strategy.by, "Strategy matched nothing");
                continue;
            }

            debug!(
                name = %target,
                strategy = index,
                by = %strategy.by,
                count = ids.len(),
                "Target resolved"
            );
            return ids
                .into_iter()
                .map(|id| ElementHandle {
                    id,
                    scope: search_root.cloned(),
                    target: target.name().to_string(),
                    strategy: index,
                })
                .collect();
        }

        debug!(name = %target, "No strategy matched");
        Vec::new()
    }

    /// Returns the first element of the first strategy that matches.
    pub async fn resolve_first(&self, target: &Target, scope: Scope<'_>) -> Option<ElementHandle> {
        self.resolve_all(target, scope).await.into_iter().next()
    }

    /// Returns the visible text of `element`, `None` if it cannot be read.
    pub async fn text_of(&self, element: &ElementId) -> Option<String> {
        match self.driver.text(element).await {
            Ok(text) => Some(text),
            Err(e) => {
                trace!(element = %element, error = %e, "Text read failed");
                None
            }
        }
    }

    async fn run(&self, strategy: &Strategy, parent: Option<&ElementId>) -> Vec<ElementId> {
        let found = match self.driver.find_elements(parent, &strategy.by).await {
            Ok(found) => found,
            Err(e) => {
                debug!(by = %strategy.by, error = %e, "Query failed, treating as no match");
                return Vec::new();
            }
        };

        let mut kept = Vec::with_capacity(found.len());
        for id in found {
            if strategy.require_interactable && !self.is_interactable(&id).await {
                continue;
            }
            if let Some(filter) = &strategy.filter
                && !self.passes(filter, &id).await
            {
                continue;
            }
            kept.push(id);
        }

        strategy.pick.apply(kept)
    }

    async fn is_interactable(&self, id: &ElementId) -> bool {
        matches!(self.driver.is_displayed(id).await, Ok(true))
            && matches!(self.driver.is_enabled(id).await, Ok(true))
    }

    async fn passes(&self, filter: &TextMatch, id: &ElementId) -> bool {
        for by in filter.descendants() {
            if let Ok(found) = self.driver.find_elements(Some(id), by).await
                && let Some(first) = found.first()
            {
                return self
                    .text_of(first)
                    .await
                    .is_some_and(|text| filter.is_match(&text));
            }
        }
        self.text_of(id)
            .await
            .is_some_and(|text| filter.is_match(&text))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Dom, MemoryDriver, Node};
    use crate::locator::By;

    fn shop() -> MemoryDriver {
        let mut dom = Dom::new();
        let root = dom.root();
        let cart = dom.append(root, Node::new("div").with_class("float-cart"));
        for (title, qty) in [("iPhone 12", "1"), ("Galaxy S20", "2")] {
            let item = dom.append(cart, Node::new("div").with_class("shelf-item"));
            let details = dom.append(item, Node::new("div").with_class("shelf-item__details"));
            dom.append(details, Node::new("p").with_class("title").with_text(title));
            dom.append(details, Node::new("p").with_text(format!("Quantity: {qty}")));
            dom.append(item, Node::new("button").with_text("-"));
            dom.append(item, Node::new("button").with_text("+"));
        }
        dom.append(root, Node::new("button").with_class("ghost").hidden());
        MemoryDriver::from_dom(dom)
    }

    #[tokio::test]
    async fn test_third_strategy_wins_when_first_two_miss() {
        let driver = shop();
        let resolver = Resolver::new(&driver);
        let target = Target::new("cart-root", "div.cart-panel")
            .or(Strategy::xpath("//div[@class='float-cart']"))
            .or("div.float-cart");

        let handle = resolver.resolve_first(&target, Scope::Document).await.unwrap();
        assert_eq!(handle.strategy_index(), 2);
        assert_eq!(handle.target(), "cart-root");
        assert!(handle.scope().is_none());
    }

    #[tokio::test]
    async fn test_nothing_matches_is_empty() {
        let driver = shop();
        let resolver = Resolver::new(&driver);
        let target = Target::new("missing", ".nope").or(Strategy::xpath("//nope"));
        assert!(resolver.resolve_all(&target, Scope::Document).await.is_empty());
    }

    #[tokio::test]
    async fn test_text_filter_in_descendant() {
        let driver = shop();
        let resolver = Resolver::new(&driver);
        let target = Target::new("item-by-title", ".shelf-item")
            .filtered(TextMatch::contains("galaxy").in_descendant(By::css("p.title")));

        let items = resolver.resolve_all(&target, Scope::Document).await;
        assert_eq!(items.len(), 1);
        let text = resolver.text_of(items[0].id()).await.unwrap();
        assert!(text.contains("Quantity: 2"));
    }

    #[tokio::test]
    async fn test_scoped_resolution_and_last_pick() {
        let driver = shop();
        let resolver = Resolver::new(&driver);
        let item_target = Target::new("item", ".shelf-item").filtered(TextMatch::contains("iphone"));
        let item = resolver.resolve_first(&item_target, Scope::Document).await.unwrap();

        let plus = Target::new("plus", Strategy::css("button").containing("+"))
            .or(Strategy::css("button").last());
        let handle = resolver.resolve_first(&plus, Scope::Within(&item)).await.unwrap();
        assert_eq!(handle.strategy_index(), 0);
        assert_eq!(handle.scope(), Some(item.id()));
        assert_eq!(resolver.text_of(handle.id()).await.unwrap(), "+");

        let buttons = resolver
            .resolve_all(&Target::new("buttons", "button"), Scope::Within(&item))
            .await;
        assert_eq!(buttons.len(), 2);
    }

    #[tokio::test]
    async fn test_interactable_skips_hidden() {
        let driver = shop();
        let resolver = Resolver::new(&driver);
        let ghost = Target::new("ghost", Strategy::css("button.ghost").interactable());
        assert!(resolver.resolve_first(&ghost, Scope::Document).await.is_none());

        let document_wide = Target::new("ghost", Strategy::css("button.ghost").document_wide());
        let cart = resolver
            .resolve_first(&Target::new("cart", "div.float-cart"), Scope::Document)
            .await
            .unwrap();
        let found = resolver.resolve_first(&document_wide, Scope::Within(&cart)).await;
        assert!(found.is_some_and(|h| h.scope().is_none()));
    }

    #[tokio::test]
    async fn test_stale_scope_resolves_nothing() {
        let driver = shop();
        let resolver = Resolver::new(&driver);
        let cart = resolver
            .resolve_first(&Target::new("cart", "div.float-cart"), Scope::Document)
            .await
            .unwrap();
        driver.dom(|dom| {
            let node = dom.lookup(cart.id()).unwrap();
            dom.remove(node);
        });
        let items = resolver
            .resolve_all(&Target::new("items", ".shelf-item"), Scope::Within(&cart))
            .await;
        assert!(items.is_empty());
    }
}
