//! Per-conversation state that sits beside the workflow projection.
//!
//! [`SessionTrackers`] decides which transient agent output is shown
//! (the latest progress bubble, the list of agent responses) and which
//! work item the conversation is about. [`ErrorNotifier`] turns the
//! transport's error value into one-shot notices.

mod notifier;
mod trackers;

pub use notifier::{ErrorNotice, ErrorNotifier};
pub use trackers::SessionTrackers;
