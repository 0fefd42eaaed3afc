//! One candidate way of finding a target.
//!
//! A [`Strategy`] is a [`By`] query plus three refinements applied by the
//! resolver, in this order:
//!
//! 1. `require_interactable` keeps only displayed and enabled elements
//! 2. `filter` keeps elements whose text contains a needle
//! 3. `pick` narrows the ordered set to all, first or last
//!
//! Strategies are plain data and never touch the page themselves.

use serde::{Deserialize, Serialize};

use super::selector::By;

// ============================================================================
// Pick
// ============================================================================

/// Which of the matched elements a strategy yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pick {
    /// Every match, in document order.
    #[default]
    All,
    /// The first match in document order.
    First,
    /// The last match in document order.
    Last,
}

impl Pick {
    /// Applies the pick rule to an ordered set.
    #[must_use]
    pub fn apply<T>(self, mut items: Vec<T>) -> Vec<T> {
        match self {
            Self::All => items,
            Self::First => {
                items.truncate(1);
                items
            }
            Self::Last => items.pop().into_iter().collect(),
        }
    }
}

// ============================================================================
// TextMatch
// ============================================================================

/// Case-insensitive substring (or whole-text) test against visible text.
///
/// With `descendants` set, the text of the first descendant found by those
/// selectors is tested instead of the whole element text. If none of them
/// finds anything, the element's own visible text is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    needle: String,
    #[serde(default)]
    descendants: Vec<By>,
    #[serde(default)]
    exact: bool,
}

impl TextMatch {
    /// Matches elements whose visible text contains `needle`, ignoring case.
    #[must_use]
    pub fn contains(needle: impl AsRef<str>) -> Self {
        Self {
            needle: needle.as_ref().to_lowercase(),
            descendants: Vec::new(),
            exact: false,
        }
    }

    /// Matches elements whose trimmed visible text equals `needle`,
    /// ignoring case.
    #[must_use]
    pub fn equals(needle: impl AsRef<str>) -> Self {
        Self {
            needle: needle.as_ref().trim().to_lowercase(),
            descendants: Vec::new(),
            exact: true,
        }
    }

    /// Tests the text of a designated descendant instead.
    #[must_use]
    pub fn in_descendant(mut self, by: impl Into<By>) -> Self {
        self.descendants.push(by.into());
        self
    }

    /// Returns the lowercased needle.
    #[inline]
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Returns the descendant selectors, in priority order.
    #[inline]
    #[must_use]
    pub fn descendants(&self) -> &[By] {
        &self.descendants
    }

    /// Returns `true` if `text` matches the needle, ignoring case.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        if self.exact {
            text.trim() == self.needle
        } else {
            text.contains(&self.needle)
        }
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// A query descriptor: selector, scope flag and pick rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// The selector.
    pub by: By,
    /// Search below the resolution scope (`true`) or the whole document.
    pub within_scope: bool,
    /// Which matches to keep.
    pub pick: Pick,
    /// Keep only displayed and enabled elements.
    pub require_interactable: bool,
    /// Optional text filter.
    pub filter: Option<TextMatch>,
}

impl Strategy {
    /// Creates a scoped strategy that yields every match.
    #[must_use]
    pub fn new(by: impl Into<By>) -> Self {
        Self {
            by: by.into(),
            within_scope: true,
            pick: Pick::All,
            require_interactable: false,
            filter: None,
        }
    }

    /// Shorthand for `Strategy::new(By::css(selector))`.
    #[inline]
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(By::css(selector))
    }

    /// Shorthand for `Strategy::new(By::xpath(expr))`.
    #[inline]
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(By::xpath(expr))
    }

    /// Searches the whole document even when resolving inside a scope.
    #[inline]
    #[must_use]
    pub fn document_wide(mut self) -> Self {
        self.within_scope = false;
        self
    }

    /// Keeps only the first match.
    #[inline]
    #[must_use]
    pub fn first(mut self) -> Self {
        self.pick = Pick::First;
        self
    }

    /// Keeps only the last match.
    #[inline]
    #[must_use]
    pub fn last(mut self) -> Self {
        self.pick = Pick::Last;
        self
    }

    /// Keeps only displayed and enabled matches.
    #[inline]
    #[must_use]
    pub fn interactable(mut self) -> Self {
        self.require_interactable = true;
        self
    }

    /// Keeps only matches whose text passes `filter`.
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: TextMatch) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Shorthand for `with_filter(TextMatch::contains(needle))`.
    #[inline]
    #[must_use]
    pub fn containing(self, needle: impl AsRef<str>) -> Self {
        self.with_filter(TextMatch::contains(needle))
    }
}

impl From<By> for Strategy {
    fn from(by: By) -> Self {
        Self::new(by)
    }
}

impl From<&str> for Strategy {
    /// CSS selector strategy.
    fn from(selector: &str) -> Self {
        Self::css(selector)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_rules() {
        assert_eq!(Pick::All.apply(vec![1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(Pick::First.apply(vec![1, 2, 3]), vec![1]);
        assert_eq!(Pick::Last.apply(vec![1, 2, 3]), vec![3]);
        assert!(Pick::Last.apply(Vec::<i32>::new()).is_empty());
    }

    #[test]
    fn test_text_match_ignores_case() {
        let m = TextMatch::contains("IPHONE");
        assert_eq!(m.needle(), "iphone");
        assert!(m.is_match("Apple iPhone 12 Mini"));
        assert!(!m.is_match("Galaxy S20"));
    }

    #[test]
    fn test_text_match_equals_whole_text() {
        let m = TextMatch::equals("  iPhone 12 ");
        assert!(m.is_match("IPHONE 12\n"));
        assert!(!m.is_match("iPhone 12 Mini"));
    }

    #[test]
    fn test_builder_chain() {
        let s = Strategy::css("button").interactable().last().document_wide();
        assert!(s.require_interactable);
        assert_eq!(s.pick, Pick::Last);
        assert!(!s.within_scope);
        assert!(s.filter.is_none());
    }

    #[test]
    fn test_from_str_is_scoped_css() {
        let s: Strategy = ".qty".into();
        assert_eq!(s.by, By::css(".qty"));
        assert!(s.within_scope);
        assert_eq!(s.pick, Pick::All);
    }

    #[test]
    fn test_containing_sets_filter() {
        let s = Strategy::new(By::tag("button")).containing("+");
        assert_eq!(s.filter, Some(TextMatch::contains("+")));
    }
}
