//! # Zombie Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Terrain, blueprint and session fixtures
//! - A feedback sink that records every call
//! - An overhead screen picker for scripting input
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod feedback;
pub mod fixtures;
pub mod picker;

/// Re-export proptest for convenience.
pub use proptest;
