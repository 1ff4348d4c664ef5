//! The event-to-state projection engine.
//!
//! [`AgentStageResolver`] maps an event to its stage,
//! [`StageStateMachine`] applies it, and [`ProgressAggregator`] derives
//! the overall completion figure.

mod aggregate;
mod machine;
mod resolver;

pub use aggregate::ProgressAggregator;
pub use machine::{check_invariants, StageStateMachine};
pub use resolver::AgentStageResolver;
