//! Read-only predicates over DOM state.
//!
//! A [`Condition`] re-resolves everything it reads on every evaluation;
//! nothing is cached between polls. Change conditions compare a fresh read
//! against a baseline the caller captured before acting.
//!
//! | Condition | Met when |
//! |-----------|----------|
//! | [`Present`] | target resolves |
//! | [`Visible`] | target resolves and is displayed |
//! | [`Absent`] | target does not resolve |
//! | [`Changed`] | reader reads a value different from the baseline |
//! | [`ChangedWithFallback`] | primary changed, or both primary reads absent and secondary changed |
//! | [`Satisfies`] | reader reads a value passing a predicate |
//! | [`UrlContains`] | current URL contains a fragment |
//! | [`AnyOf`] | either of two conditions is met |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;

use crate::driver::WebDriver;
use crate::error::Result;
use crate::locator::{ElementHandle, Resolver, Scope, Target};

use super::poller::Observation;

// ============================================================================
// Traits
// ============================================================================

/// A predicate the poller can evaluate repeatedly.
#[async_trait]
pub trait Condition: Send + Sync {
    /// Value carried by observations.
    type Value: Send;

    /// Short description for logs.
    fn describe(&self) -> String;

    /// Evaluates the predicate against current DOM state.
    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<Self::Value>>;
}

/// Reads one value from the page.
///
/// `Ok(None)` means "absent": the element is missing or its text carries
/// no value.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Value read.
    type Output: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Short description for logs.
    fn describe(&self) -> String;

    /// Reads the current value.
    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<Self::Output>>;
}

// ============================================================================
// TextProbe
// ============================================================================

/// Reads a target's visible text, optionally inside a parent target.
///
/// Blank text reads as absent.
#[derive(Debug, Clone)]
pub struct TextProbe {
    target: Target,
    parent: Option<Target>,
}

impl TextProbe {
    /// Reads `target` from the whole document.
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            target,
            parent: None,
        }
    }

    /// Resolves `parent` first and reads `target` inside it.
    #[must_use]
    pub fn within(mut self, parent: Target) -> Self {
        self.parent = Some(parent);
        self
    }
}

#[async_trait]
impl Probe for TextProbe {
    type Output = String;

    fn describe(&self) -> String {
        match &self.parent {
            Some(parent) => format!("text of {} in {}", self.target, parent),
            None => format!("text of {}", self.target),
        }
    }

    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<String>> {
        let resolver = Resolver::new(driver);
        let parent = match &self.parent {
            Some(parent) => match resolver.resolve_first(parent, Scope::Document).await {
                Some(handle) => Some(handle),
                None => return Ok(None),
            },
            None => None,
        };
        let scope = parent.as_ref().map_or(Scope::Document, Scope::Within);

        let Some(handle) = resolver.resolve_first(&self.target, scope).await else {
            return Ok(None);
        };
        let text = driver.text(handle.id()).await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

/// Counts the elements a target resolves to.
///
/// Zero is a value, not an absent read, so a first row appearing counts
/// as a change.
#[derive(Debug, Clone)]
pub struct CountProbe {
    target: Target,
}

impl CountProbe {
    /// Counts `target` across the whole document.
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Probe for CountProbe {
    type Output = usize;

    fn describe(&self) -> String {
        format!("count of {}", self.target)
    }

    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<usize>> {
        let all = Resolver::new(driver)
            .resolve_all(&self.target, Scope::Document)
            .await;
        Ok(Some(all.len()))
    }
}

/// Reads one attribute of a target. Blank values read as absent.
#[derive(Debug, Clone)]
pub struct AttributeProbe {
    target: Target,
    name: String,
}

impl AttributeProbe {
    /// Reads attribute `name` of `target`.
    #[must_use]
    pub fn new(target: Target, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }
}

#[async_trait]
impl Probe for AttributeProbe {
    type Output = String;

    fn describe(&self) -> String {
        format!("{} of {}", self.name, self.target)
    }

    async fn read(&self, driver: &dyn WebDriver) -> Result<Option<String>> {
        let Some(handle) = Resolver::new(driver)
            .resolve_first(&self.target, Scope::Document)
            .await
        else {
            return Ok(None);
        };
        Ok(driver
            .attribute(handle.id(), &self.name)
            .await?
            .filter(|v| !v.trim().is_empty()))
    }
}

// ============================================================================
// Presence Conditions
// ============================================================================

/// Met when the target resolves.
#[derive(Debug, Clone)]
pub struct Present {
    target: Target,
}

impl Present {
    /// Creates the condition.
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Condition for Present {
    type Value = ElementHandle;

    fn describe(&self) -> String {
        format!("{} present", self.target)
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<ElementHandle>> {
        Ok(
            match Resolver::new(driver)
                .resolve_first(&self.target, Scope::Document)
                .await
            {
                Some(handle) => Observation::Met(handle),
                None => Observation::Unmet(None),
            },
        )
    }
}

/// Met when the target resolves to a displayed element.
#[derive(Debug, Clone)]
pub struct Visible {
    target: Target,
}

impl Visible {
    /// Creates the condition.
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Condition for Visible {
    type Value = ElementHandle;

    fn describe(&self) -> String {
        format!("{} visible", self.target)
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<ElementHandle>> {
        let Some(handle) = Resolver::new(driver)
            .resolve_first(&self.target, Scope::Document)
            .await
        else {
            return Ok(Observation::Unmet(None));
        };
        if driver.is_displayed(handle.id()).await? {
            Ok(Observation::Met(handle))
        } else {
            Ok(Observation::Unmet(Some(handle)))
        }
    }
}

/// Met when the target no longer resolves.
#[derive(Debug, Clone)]
pub struct Absent {
    target: Target,
    parent: Option<Target>,
}

impl Absent {
    /// Creates the condition.
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            target,
            parent: None,
        }
    }

    /// Checks absence inside `parent`. A missing parent counts as absent.
    #[must_use]
    pub fn within(mut self, parent: Target) -> Self {
        self.parent = Some(parent);
        self
    }
}

#[async_trait]
impl Condition for Absent {
    type Value = ();

    fn describe(&self) -> String {
        format!("{} absent", self.target)
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<()>> {
        let resolver = Resolver::new(driver);
        let parent = match &self.parent {
            Some(parent) => match resolver.resolve_first(parent, Scope::Document).await {
                Some(handle) => Some(handle),
                None => return Ok(Observation::Met(())),
            },
            None => None,
        };
        let scope = parent.as_ref().map_or(Scope::Document, Scope::Within);

        Ok(match resolver.resolve_first(&self.target, scope).await {
            Some(_) => Observation::Unmet(Some(())),
            None => Observation::Met(()),
        })
    }
}

// ============================================================================
// Changed
// ============================================================================

/// Met when the reader reads a present value different from the baseline.
///
/// [`Changed::increasing`] narrows this to values greater than the
/// baseline; any present value beats an absent baseline.
#[derive(Debug, Clone)]
pub struct Changed<P: Probe> {
    reader: P,
    baseline: Option<P::Output>,
    accept: fn(&P::Output, Option<&P::Output>) -> bool,
    verb: &'static str,
}

impl<P: Probe> Changed<P> {
    /// Creates the condition with an explicit baseline.
    #[must_use]
    pub fn new(reader: P, baseline: Option<P::Output>) -> Self {
        Self {
            reader,
            baseline,
            accept: differs,
            verb: "changed",
        }
    }

    /// Reads the baseline from the page now.
    ///
    /// A failed read captures the absent baseline.
    pub async fn capture(reader: P, driver: &dyn WebDriver) -> Self {
        let baseline = reader.read(driver).await.ok().flatten();
        Self::new(reader, baseline)
    }

    /// Only accepts values greater than the baseline.
    #[must_use]
    pub fn increasing(mut self) -> Self
    where
        P::Output: PartialOrd,
    {
        self.accept = increases;
        self.verb = "increased";
        self
    }

    /// Returns the captured baseline.
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> Option<&P::Output> {
        self.baseline.as_ref()
    }
}

#[async_trait]
impl<P: Probe> Condition for Changed<P> {
    type Value = P::Output;

    fn describe(&self) -> String {
        format!(
            "{} {} from {:?}",
            self.reader.describe(),
            self.verb,
            self.baseline
        )
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<P::Output>> {
        Ok(match self.reader.read(driver).await? {
            Some(current) if (self.accept)(&current, self.baseline.as_ref()) => {
                Observation::Met(current)
            }
            other => Observation::Unmet(other),
        })
    }
}

fn differs<T: PartialEq>(current: &T, baseline: Option<&T>) -> bool {
    baseline != Some(current)
}

fn increases<T: PartialOrd>(current: &T, baseline: Option<&T>) -> bool {
    baseline.is_none_or(|b| current > b)
}

// ============================================================================
// ChangedWithFallback
// ============================================================================

/// Which signal confirmed a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The primary reader changed.
    Primary,
    /// The primary reader was absent before and after; the secondary changed.
    Secondary,
}

/// Both reads from one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualObservation<A, B> {
    /// Primary read.
    pub primary: Option<A>,
    /// Secondary read; only taken when the primary is absent.
    pub secondary: Option<B>,
    /// Confirming signal, `None` while unmet.
    pub via: Option<Signal>,
}

/// A change condition with a secondary signal for the "absent before and
/// after" case.
///
/// Met when the primary value is present and differs from its baseline.
/// If the primary baseline and the current primary read are both absent,
/// a present secondary value that differs from its baseline is accepted
/// instead.
#[derive(Debug, Clone)]
pub struct ChangedWithFallback<P: Probe, S: Probe> {
    primary: Changed<P>,
    secondary: Changed<S>,
}

impl<P: Probe, S: Probe> ChangedWithFallback<P, S> {
    /// Creates the condition from two change conditions.
    #[must_use]
    pub fn new(primary: Changed<P>, secondary: Changed<S>) -> Self {
        Self { primary, secondary }
    }

    /// Reads both baselines from the page now.
    pub async fn capture(primary: P, secondary: S, driver: &dyn WebDriver) -> Self {
        let primary = Changed::capture(primary, driver).await;
        let secondary = Changed::capture(secondary, driver).await;
        Self { primary, secondary }
    }

    /// Returns the primary baseline.
    #[must_use]
    pub fn primary_baseline(&self) -> Option<&P::Output> {
        self.primary.baseline()
    }

    /// Returns the secondary baseline.
    #[must_use]
    pub fn secondary_baseline(&self) -> Option<&S::Output> {
        self.secondary.baseline()
    }
}

#[async_trait]
impl<P: Probe, S: Probe> Condition for ChangedWithFallback<P, S> {
    type Value = DualObservation<P::Output, S::Output>;

    fn describe(&self) -> String {
        format!(
            "{} (fallback: {})",
            self.primary.describe(),
            self.secondary.describe()
        )
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<Self::Value>> {
        let primary = match self.primary.evaluate(driver).await? {
            Observation::Met(value) => {
                return Ok(Observation::Met(DualObservation {
                    primary: Some(value),
                    secondary: None,
                    via: Some(Signal::Primary),
                }));
            }
            Observation::Unmet(seen) => seen,
        };

        if primary.is_some() || self.primary.baseline().is_some() {
            return Ok(Observation::Unmet(Some(DualObservation {
                primary,
                secondary: None,
                via: None,
            })));
        }

        Ok(match self.secondary.evaluate(driver).await? {
            Observation::Met(value) => Observation::Met(DualObservation {
                primary: None,
                secondary: Some(value),
                via: Some(Signal::Secondary),
            }),
            Observation::Unmet(seen) => Observation::Unmet(Some(DualObservation {
                primary: None,
                secondary: seen,
                via: None,
            })),
        })
    }
}

// ============================================================================
// Satisfies
// ============================================================================

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Met when the reader reads a present value that passes a predicate.
///
/// Unlike [`Changed`] there is no baseline: a page already in the wanted
/// state satisfies the condition on the first evaluation.
pub struct Satisfies<P: Probe> {
    reader: P,
    label: String,
    predicate: Predicate<P::Output>,
}

impl<P: Probe> Satisfies<P> {
    /// Creates the condition. `label` names the predicate in logs.
    #[must_use]
    pub fn new<F>(reader: P, label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&P::Output) -> bool + Send + Sync + 'static,
    {
        Self {
            reader,
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Met when the read value equals `expected`.
    #[must_use]
    pub fn equals(reader: P, expected: P::Output) -> Self
    where
        P::Output: 'static,
    {
        let label = format!("equals {expected:?}");
        Self::new(reader, label, move |v| *v == expected)
    }
}

impl<P: Probe + fmt::Debug> fmt::Debug for Satisfies<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Satisfies")
            .field("reader", &self.reader)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: Probe> Condition for Satisfies<P> {
    type Value = P::Output;

    fn describe(&self) -> String {
        format!("{} {}", self.reader.describe(), self.label)
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<P::Output>> {
        Ok(match self.reader.read(driver).await? {
            Some(current) if (self.predicate)(&current) => Observation::Met(current),
            other => Observation::Unmet(other),
        })
    }
}

// ============================================================================
// UrlContains
// ============================================================================

/// Met when the current URL contains a fragment. Carries the URL.
#[derive(Debug, Clone)]
pub struct UrlContains {
    fragment: String,
}

impl UrlContains {
    /// Creates the condition.
    #[must_use]
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
        }
    }
}

#[async_trait]
impl Condition for UrlContains {
    type Value = String;

    fn describe(&self) -> String {
        format!("url contains {:?}", self.fragment)
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<String>> {
        let url = driver.current_url().await?;
        Ok(if url.contains(&self.fragment) {
            Observation::Met(url)
        } else {
            Observation::Unmet(Some(url))
        })
    }
}

// ============================================================================
// AnyOf
// ============================================================================

/// Which side of an [`AnyOf`] produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matched<A, B> {
    /// The first condition.
    First(A),
    /// The second condition.
    Second(B),
}

/// Met when either condition is met; the first is evaluated first.
///
/// An error from one side is only reported when the other side is unmet.
#[derive(Debug, Clone)]
pub struct AnyOf<A, B> {
    first: A,
    second: B,
}

impl<A: Condition, B: Condition> AnyOf<A, B> {
    /// Creates the condition.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

#[async_trait]
impl<A: Condition, B: Condition> Condition for AnyOf<A, B> {
    type Value = Matched<A::Value, B::Value>;

    fn describe(&self) -> String {
        format!("{} or {}", self.first.describe(), self.second.describe())
    }

    async fn evaluate(&self, driver: &dyn WebDriver) -> Result<Observation<Self::Value>> {
        let first = match self.first.evaluate(driver).await {
            Ok(Observation::Met(value)) => return Ok(Observation::Met(Matched::First(value))),
            Ok(Observation::Unmet(seen)) => Ok(seen),
            Err(e) => Err(e),
        };
        Ok(match self.second.evaluate(driver).await? {
            Observation::Met(value) => Observation::Met(Matched::Second(value)),
            Observation::Unmet(seen) => Observation::Unmet(
                first?
                    .map(Matched::First)
                    .or(seen.map(Matched::Second)),
            ),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
