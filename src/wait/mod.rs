//! Bounded waiting for expected state changes.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `poller` | [`Poller`], [`PollResult`], [`Observation`] |
//! | `condition` | [`Condition`], [`Probe`] and the built-in conditions |
//! | `download` | [`Downloaded`], a finished file in a download directory |

// ============================================================================
// Submodules
// ============================================================================

/// Read-only predicates over DOM state.
pub mod condition;

/// Finished downloads on disk.
pub mod download;

/// Fixed-interval convergence poller.
pub mod poller;

// ============================================================================
// Re-exports
// ============================================================================

pub use condition::{
    Absent, AnyOf, AttributeProbe, Changed, ChangedWithFallback, Condition, CountProbe,
    DualObservation, Matched, Present, Probe, Satisfies, Signal, TextProbe, UrlContains, Visible,
};
pub use download::Downloaded;
pub use poller::{Observation, PollResult, Poller};
