//! Timestamp helpers.

pub mod timestamps;

pub use timestamps::{iso_timestamp, now_utc, Timestamp};
