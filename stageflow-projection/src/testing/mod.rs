//! Testing utilities for the projection.
//!
//! This module provides:
//! - Event and message fixtures
//! - Workflow state assertions

pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_initial, assert_invariants, assert_single_active, assert_stage};
