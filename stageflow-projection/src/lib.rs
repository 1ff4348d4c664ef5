//! # Stageflow Projection
//!
//! Projects the event stream of a multi-agent delivery pipeline onto a
//! fixed set of stages (analyze, design, code, test, deploy).
//!
//! The crate provides:
//!
//! - **Event classification**: raw `ui` events split into `progress`,
//!   `content_ready` and `ai_response`
//! - **Stage state machine**: one event at a time, at most one active stage
//! - **Progress aggregation**: a single 0-100 figure for the whole workflow
//! - **Message filtering**: replayed and hidden conversation turns removed
//! - **Identifier detection**: work-item codes in user input reset the pipeline
//! - **Simulation**: a deterministic event script for demos and tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stageflow_projection::prelude::*;
//!
//! let machine = StageStateMachine::default();
//! let mut state = WorkflowData::new();
//! for event in ProgressSimulator::default().events() {
//!     machine.apply_raw(&mut state, &event, now_utc());
//! }
//! assert_eq!(state.overall_progress, 100);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod controller;
pub mod core;
pub mod detection;
pub mod errors;
pub mod events;
pub mod messages;
pub mod observability;
pub mod projection;
pub mod session;
pub mod simulation;
pub mod testing;
pub mod transport;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{LogFormat, ProgressPolicy, ProjectionConfig};
    pub use crate::controller::{ControllerHandle, ProgressTicker, WorkflowController};
    pub use crate::core::{Stage, StageId, StagePayload, StageStatus, WorkflowData};
    pub use crate::detection::{EpicTracker, IdentifierDetector};
    pub use crate::errors::ProjectionError;
    pub use crate::events::{
        CollectingEventSink, EventClassifier, EventKind, EventSink, LoggingEventSink,
        NoOpEventSink, ProjectionNotice, StageData, UiEvent, WorkflowEvent,
    };
    pub use crate::messages::{Message, MessageFilter, MessageRole};
    pub use crate::projection::{AgentStageResolver, ProgressAggregator, StageStateMachine};
    pub use crate::session::{ErrorNotifier, SessionTrackers};
    pub use crate::simulation::{PlaybackTiming, ProgressSimulator};
    pub use crate::transport::{InMemoryTransport, StreamSnapshot, StreamTransport, SubmitRequest};
    pub use crate::utils::{iso_timestamp, now_utc, Timestamp};
}
