//! Work-item identifier detection in free-form user text.

mod identifier;

pub use identifier::{EpicTracker, IdentifierDetector};
