//! Engine timing configuration.
//!
//! All durations are stored in milliseconds so options can be loaded from
//! JSON:
//!
//! ```json
//! { "timeout_ms": 10000, "poll_interval_ms": 200 }
//! ```
//!
//! Missing fields take their defaults.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default overall wait timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Default wait for an element to become displayed and enabled.
pub const DEFAULT_INTERACTABLE_TIMEOUT_MS: u64 = 5_000;

/// Default interval between condition evaluations.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default pause between repeated actions.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 200;

/// Largest accepted poll interval.
pub const MAX_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// EngineOptions
// ============================================================================

/// Timeouts and intervals used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Overall timeout for waits that do not pass their own.
    pub timeout_ms: u64,

    /// How long the primary action path waits for interactability.
    pub interactable_timeout_ms: u64,

    /// Interval between condition evaluations.
    pub poll_interval_ms: u64,

    /// Pause between repetitions of one action.
    pub settle_delay_ms: u64,

    /// Include a screenshot in soft-failure diagnostics.
    pub capture_screenshots: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interactable_timeout_ms: DEFAULT_INTERACTABLE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            capture_screenshots: false,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl EngineOptions {
    /// Creates default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON, filling in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] on malformed input and
    /// [`crate::Error::Config`] if the values fail validation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate().map_err(crate::Error::config)?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl EngineOptions {
    /// Sets the overall wait timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = millis(timeout);
        self
    }

    /// Sets the interactability timeout.
    #[inline]
    #[must_use]
    pub fn with_interactable_timeout(mut self, timeout: Duration) -> Self {
        self.interactable_timeout_ms = millis(timeout);
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = millis(interval);
        self
    }

    /// Sets the settle delay between repeated actions.
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = millis(delay);
        self
    }

    /// Includes screenshots in soft-failure diagnostics.
    #[inline]
    #[must_use]
    pub fn with_screenshots(mut self) -> Self {
        self.capture_screenshots = true;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl EngineOptions {
    /// Overall wait timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interactability timeout.
    #[inline]
    #[must_use]
    pub fn interactable_timeout(&self) -> Duration {
        Duration::from_millis(self.interactable_timeout_ms)
    }

    /// Poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle delay.
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than zero".to_string());
        }
        if self.interactable_timeout_ms == 0 {
            return Err("Interactable timeout must be greater than zero".to_string());
        }
        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(format!(
                "Poll interval must be between 1 and {MAX_POLL_INTERVAL_MS} ms, got {}",
                self.poll_interval_ms
            ));
        }
        Ok(())
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(8));
        assert_eq!(options.interactable_timeout(), Duration::from_secs(5));
        assert_eq!(options.poll_interval(), Duration::from_millis(250));
        assert_eq!(options.settle_delay(), Duration::from_millis(200));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = EngineOptions::new()
            .with_timeout(Duration::from_secs(12))
            .with_poll_interval(Duration::from_millis(100))
            .with_screenshots();
        assert_eq!(options.timeout_ms, 12_000);
        assert_eq!(options.poll_interval_ms, 100);
        assert!(options.capture_screenshots);
    }

    #[test]
    fn test_validate_poll_interval_bounds() {
        let zero = EngineOptions::new().with_poll_interval(Duration::ZERO);
        assert!(zero.validate().is_err());

        let slow = EngineOptions::new().with_poll_interval(Duration::from_millis(501));
        assert!(slow.validate().is_err());

        let edge = EngineOptions::new().with_poll_interval(Duration::from_millis(500));
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let options = EngineOptions::new().with_timeout(Duration::ZERO);
        assert!(options.validate().unwrap_err().contains("Timeout"));
    }

    #[test]
    fn test_from_json_partial() {
        let options = EngineOptions::from_json(r#"{"timeout_ms": 5000}"#).unwrap();
        assert_eq!(options.timeout_ms, 5000);
        assert_eq!(options.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = EngineOptions::from_json(r#"{"poll_interval_ms": 2000}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Config { .. }));
    }
}
