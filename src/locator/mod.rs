//! Locator strategy lists.
//!
//! A [`Target`] names a UI element and lists the ways of finding it; the
//! [`Resolver`] tries them in order and returns the first non-empty match.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `selector` | [`By`] query descriptors |
//! | `strategy` | [`Strategy`], [`Pick`], [`TextMatch`] |
//! | `target` | [`Target`] |
//! | `resolver` | [`Resolver`], [`Scope`], [`ElementHandle`] |

// ============================================================================
// Submodules
// ============================================================================

/// Strategy-list resolution.
pub mod resolver;

/// Element query descriptors.
pub mod selector;

/// Strategy descriptors.
pub mod strategy;

/// Logical UI targets.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use resolver::{ElementHandle, Resolver, Scope};
pub use selector::By;
pub use strategy::{Pick, Strategy, TextMatch};
pub use target::Target;
