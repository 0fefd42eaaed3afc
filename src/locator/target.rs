//! Logical UI targets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::strategy::{Strategy, TextMatch};

/// A named UI element plus its ordered fallback strategies.
///
/// A target always has at least one strategy: the constructor takes the
/// first one and [`Target::or`] appends the rest.
///
/// # Example
///
/// ```
/// use resilient_ui::{Strategy, Target};
///
/// let subtotal = Target::new("subtotal", "p.sub-price__val")
///     .or(".sub-price__val")
///     .or(Strategy::xpath("//*[contains(text(),'Subtotal')]"));
/// assert_eq!(subtotal.strategies().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTarget")]
pub struct Target {
    name: String,
    strategies: Vec<Strategy>,
}

/// Unchecked wire form of [`Target`].
#[derive(Deserialize)]
struct RawTarget {
    name: String,
    strategies: Vec<Strategy>,
}

impl TryFrom<RawTarget> for Target {
    type Error = Error;

    fn try_from(raw: RawTarget) -> Result<Self> {
        Self::from_strategies(raw.name, raw.strategies)
    }
}

impl Target {
    /// Creates a target with its primary strategy.
    #[must_use]
    pub fn new(name: impl Into<String>, first: impl Into<Strategy>) -> Self {
        Self {
            name: name.into(),
            strategies: vec![first.into()],
        }
    }

    /// Creates a target from a prepared strategy list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `strategies` is empty.
    pub fn from_strategies(name: impl Into<String>, strategies: Vec<Strategy>) -> Result<Self> {
        let name = name.into();
        if strategies.is_empty() {
            return Err(Error::config(format!("target {name:?} has no strategies")));
        }
        Ok(Self { name, strategies })
    }

    /// Appends a fallback strategy.
    #[must_use]
    pub fn or(mut self, strategy: impl Into<Strategy>) -> Self {
        self.strategies.push(strategy.into());
        self
    }

    /// Applies a text filter to every strategy that has none yet.
    #[must_use]
    pub fn filtered(mut self, filter: TextMatch) -> Self {
        for strategy in &mut self.strategies {
            if strategy.filter.is_none() {
                strategy.filter = Some(filter.clone());
            }
        }
        self
    }

    /// Returns the logical name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the strategies, in evaluation order. Never empty.
    #[inline]
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
