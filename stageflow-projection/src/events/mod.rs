//! Event intake and notice emission.
//!
//! Raw events arrive as [`UiEvent`]s, are classified into
//! [`WorkflowEvent`]s, and the projection reports what it did through an
//! [`EventSink`].

mod event;
mod sink;

pub use event::{ClassifiedEvents, EventClassifier, EventKind, StageData, UiEvent, WorkflowEvent};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, ProjectionNotice};
