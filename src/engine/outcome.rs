//! End-to-end operation results.

use crate::action::RepeatReport;
use crate::diagnostics::Diagnostics;

/// Result of a resolve → act → wait operation.
///
/// `SoftFail` means the action ran but its effect was not confirmed in time.
/// It is distinct from `Fail`, where nothing could be attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome<T> {
    /// The expected change was observed.
    Success {
        /// Value that satisfied the condition.
        value: T,
        /// Per-attempt action outcomes.
        action: RepeatReport,
    },
    /// The action ran, the change was not observed before the timeout.
    SoftFail {
        /// Last value the condition observed.
        last_observed: Option<T>,
        /// Per-attempt action outcomes.
        action: RepeatReport,
        /// Page state at the time of giving up.
        diagnostics: Diagnostics,
    },
    /// The operation could not start (target not found).
    Fail {
        /// Human readable reason.
        reason: String,
    },
}

impl<T> OperationOutcome<T> {
    /// Creates a failure.
    #[inline]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }

    /// Returns `true` on success.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns `true` on soft failure.
    #[inline]
    #[must_use]
    pub fn is_soft_fail(&self) -> bool {
        matches!(self, Self::SoftFail { .. })
    }

    /// Returns `true` on hard failure.
    #[inline]
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// Returns `true` if any action attempt was made.
    #[must_use]
    pub fn was_attempted(&self) -> bool {
        self.report().is_some_and(|r| !r.is_empty())
    }

    /// Returns the action report, `None` on hard failure.
    #[must_use]
    pub fn report(&self) -> Option<&RepeatReport> {
        match self {
            Self::Success { action, .. } | Self::SoftFail { action, .. } => Some(action),
            Self::Fail { .. } => None,
        }
    }

    /// Returns the satisfying value, `None` unless successful.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Maps the carried value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationOutcome<U> {
        match self {
            Self::Success { value, action } => OperationOutcome::Success {
                value: f(value),
                action,
            },
            Self::SoftFail {
                last_observed,
                action,
                diagnostics,
            } => OperationOutcome::SoftFail {
                last_observed: last_observed.map(f),
                action,
                diagnostics,
            },
            Self::Fail { reason } => OperationOutcome::Fail { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionOutcome;

    fn report(n: usize) -> RepeatReport {
        RepeatReport {
            attempts: vec![ActionOutcome::Performed; n],
        }
    }

    #[test]
    fn test_predicates() {
        let ok = OperationOutcome::Success {
            value: 4,
            action: report(2),
        };
        assert!(ok.is_success());
        assert!(ok.was_attempted());
        assert_eq!(ok.value(), Some(&4));

        let soft: OperationOutcome<u32> = OperationOutcome::SoftFail {
            last_observed: Some(2),
            action: report(1),
            diagnostics: Diagnostics::default(),
        };
        assert!(soft.is_soft_fail());
        assert!(soft.value().is_none());

        let fail: OperationOutcome<u32> = OperationOutcome::fail("cart item not found");
        assert!(fail.is_fail());
        assert!(!fail.was_attempted());
    }

    #[test]
    fn test_map_keeps_variant() {
        let soft: OperationOutcome<u32> = OperationOutcome::SoftFail {
            last_observed: Some(2),
            action: report(1),
            diagnostics: Diagnostics::default(),
        };
        let mapped = soft.map(|q| q.to_string());
        assert!(matches!(
            mapped,
            OperationOutcome::SoftFail { last_observed: Some(ref s), .. } if s == "2"
        ));
    }
}
