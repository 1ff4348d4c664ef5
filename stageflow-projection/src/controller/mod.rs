//! Ownership of the workflow state for one display session.
//!
//! [`WorkflowController`] is the single owner of the projected
//! [`WorkflowData`](crate::core::WorkflowData) and the session trackers.
//! [`ControllerHandle`] runs it in a task together with the
//! [`ProgressTicker`] so that events, ticks and resets are serialized.

mod handle;
mod ticker;
mod workflow;

pub use handle::ControllerHandle;
pub use ticker::ProgressTicker;
pub use workflow::WorkflowController;
