//! Convergence poller.
//!
//! Evaluates a predicate immediately, then every `interval` until it is
//! satisfied or `timeout` has elapsed. The last sleep is shortened so the
//! final evaluation happens exactly at the deadline. Evaluation errors are
//! "not yet satisfied"; the poller itself never fails.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::Result;

// ============================================================================
// Observation
// ============================================================================

/// One evaluation of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// The condition holds; carries the value that satisfied it.
    Met(T),
    /// The condition does not hold yet; carries what was seen, if anything.
    Unmet(Option<T>),
}

// ============================================================================
// PollResult
// ============================================================================

/// Final result of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult<T> {
    /// The condition held; carries the satisfying value.
    Satisfied(T),
    /// The timeout elapsed; carries the last value observed, if any.
    TimedOut(Option<T>),
}

impl<T> PollResult<T> {
    /// Returns `true` if the condition held.
    #[inline]
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }

    /// Returns `true` if the timeout elapsed.
    #[inline]
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    /// Returns the satisfying value, `None` on timeout.
    #[must_use]
    pub fn satisfied(self) -> Option<T> {
        match self {
            Self::Satisfied(v) => Some(v),
            Self::TimedOut(_) => None,
        }
    }

    /// Returns the satisfying value or the last observed one.
    #[must_use]
    pub fn into_observed(self) -> Option<T> {
        match self {
            Self::Satisfied(v) => Some(v),
            Self::TimedOut(last) => last,
        }
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Bounded, fixed-interval re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
}

impl Poller {
    /// Creates a poller.
    ///
    /// A zero interval is raised to one millisecond so the poller can never
    /// spin.
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Returns the overall timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the interval between evaluations.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls `evaluate` until it reports [`Observation::Met`] or the
    /// timeout elapses.
    ///
    /// `TimedOut` carries what the most recent successful evaluation saw,
    /// `None` included. Failed evaluations leave it untouched.
    pub async fn poll<T, F, Fut>(&self, mut evaluate: F) -> PollResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Observation<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut last = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match evaluate().await {
                Ok(Observation::Met(value)) => {
                    trace!(attempt, "Condition satisfied");
                    return PollResult::Satisfied(value);
                }
                Ok(Observation::Unmet(seen)) => last = seen,
                Err(e) => {
                    trace!(attempt, error = %e, "Evaluation failed, not yet satisfied");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                trace!(attempt, "Poll timed out");
                return PollResult::TimedOut(last);
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}

/// Whole milliseconds for log fields, saturating at `u64::MAX`.
pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::Error;
    use crate::identifiers::ElementId;

    fn poller() -> Poller {
        Poller::new(Duration::from_secs(2), Duration::from_millis(250))
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let start = Instant::now();
        let result = poller().poll(|| async { Ok(Observation::Met(7)) }).await;
        assert_eq!(result, PollResult::Satisfied(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_evaluates_at_fixed_interval() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result: PollResult<u32> = poller()
            .poll(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(Observation::Unmet(Some(n))) }
            })
            .await;

        // t = 0, 250, ..., 2000 ms
        assert_eq!(calls.load(Ordering::SeqCst), 9);
        assert_eq!(result, PollResult::TimedOut(Some(8)));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_sleep_is_clamped_to_deadline() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let p = Poller::new(Duration::from_millis(600), Duration::from_millis(250));
        let _: PollResult<()> = p
            .poll(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Observation::Unmet(None)) }
            })
            .await;

        // t = 0, 250, 500, 600 ms
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_count_as_unmet() {
        let calls = AtomicU32::new(0);
        let result = poller()
            .poll(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => Ok(Observation::Unmet(Some("2"))),
                        1 => Err(Error::stale_element(ElementId::new("e"))),
                        2 => Ok(Observation::Unmet(None)),
                        _ => Ok(Observation::Met("4")),
                    }
                }
            })
            .await;
        assert_eq!(result, PollResult::Satisfied("4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_vanished_value_is_not_reported_as_last() {
        let calls = AtomicU32::new(0);
        let result = poller()
            .poll(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(Observation::Unmet(Some("2")))
                    } else {
                        Ok(Observation::Unmet(None))
                    }
                }
            })
            .await;
        assert_eq!(result, PollResult::TimedOut(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_keeps_previous_observation() {
        let calls = AtomicU32::new(0);
        let result = poller()
            .poll(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(Observation::Unmet(Some("2")))
                    } else {
                        Err(Error::stale_element(ElementId::new("e")))
                    }
                }
            })
            .await;
        assert_eq!(result, PollResult::TimedOut(Some("2")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_evaluates_once() {
        let calls = AtomicU32::new(0);
        let p = Poller::new(Duration::ZERO, Duration::from_millis(250));
        let result: PollResult<()> = p
            .poll(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Observation::Unmet(None)) }
            })
            .await;
        assert_eq!(result, PollResult::TimedOut(None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_zero_interval_is_raised() {
        let p = Poller::new(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(p.interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_poll_result_accessors() {
        assert_eq!(PollResult::Satisfied(1).satisfied(), Some(1));
        assert_eq!(PollResult::TimedOut(Some(2)).satisfied(), None);
        assert_eq!(PollResult::TimedOut(Some(2)).into_observed(), Some(2));
        assert!(PollResult::<()>::TimedOut(None).is_timed_out());
    }
}
