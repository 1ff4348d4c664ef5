//! Notices emitted by the projection and the sinks that receive them.

use crate::core::StageId;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, Level};

/// Something observable that happened while projecting the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionNotice {
    /// A stage left `pending`.
    StageActivated {
        /// The stage.
        stage: StageId,
    },
    /// A stage reached `completed`.
    StageCompleted {
        /// The stage.
        stage: StageId,
        /// True when completion was implied by another stage taking over.
        handed_off: bool,
    },
    /// A stage was marked failed.
    StageFailed {
        /// The stage.
        stage: StageId,
        /// Failure reason.
        reason: String,
    },
    /// The workflow returned to its initial state.
    WorkflowReset {
        /// Why the reset happened.
        reason: String,
    },
    /// A new work-item identifier was seen in user input.
    EpicDetected {
        /// The identifier.
        id: String,
    },
    /// An incoming event could not be projected.
    EventDiscarded {
        /// Why it was discarded.
        reason: String,
    },
    /// The transport reported a new error.
    StreamError {
        /// The error message.
        message: String,
    },
}

impl ProjectionNotice {
    /// Dotted event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StageActivated { .. } => "stage.activated",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFailed { .. } => "stage.failed",
            Self::WorkflowReset { .. } => "workflow.reset",
            Self::EpicDetected { .. } => "workflow.epic_detected",
            Self::EventDiscarded { .. } => "event.discarded",
            Self::StreamError { .. } => "stream.error",
        }
    }

    /// Notice fields as JSON.
    #[must_use]
    pub fn data(&self) -> serde_json::Value {
        match self {
            Self::StageActivated { stage } => json!({ "stage": stage }),
            Self::StageCompleted { stage, handed_off } => {
                json!({ "stage": stage, "handed_off": handed_off })
            }
            Self::StageFailed { stage, reason } => json!({ "stage": stage, "reason": reason }),
            Self::WorkflowReset { reason } => json!({ "reason": reason }),
            Self::EpicDetected { id } => json!({ "id": id }),
            Self::EventDiscarded { reason } => json!({ "reason": reason }),
            Self::StreamError { message } => json!({ "message": message }),
        }
    }
}

/// Receives projection notices.
///
/// Projection runs synchronously and reports through
/// [`try_emit`](Self::try_emit). Paths that already await the transport,
/// such as submitting user input, await [`emit`](Self::emit) instead.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits a notice asynchronously.
    async fn emit(&self, notice: &ProjectionNotice);

    /// Emits a notice without blocking. Must never panic.
    fn try_emit(&self, notice: &ProjectionNotice);
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _notice: &ProjectionNotice) {}

    fn try_emit(&self, _notice: &ProjectionNotice) {}
}

/// Logs notices through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a sink logging at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_notice(&self, notice: &ProjectionNotice) {
        let event_type = notice.event_type();
        let data = notice.data();
        if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = %data, "Event: {}", event_type);
        } else {
            info!(event_type = %event_type, event_data = %data, "Event: {}", event_type);
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, notice: &ProjectionNotice) {
        self.log_notice(notice);
    }

    fn try_emit(&self, notice: &ProjectionNotice) {
        self.log_notice(notice);
    }
}

/// Keeps every notice in memory; for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    notices: parking_lot::RwLock<Vec<ProjectionNotice>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected notices.
    #[must_use]
    pub fn notices(&self) -> Vec<ProjectionNotice> {
        self.notices.read().clone()
    }

    /// Number of collected notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.read().is_empty()
    }

    /// Drops all collected notices.
    pub fn clear(&self) {
        self.notices.write().clear();
    }

    /// Notices whose event type starts with `prefix`.
    #[must_use]
    pub fn notices_of_type(&self, prefix: &str) -> Vec<ProjectionNotice> {
        self.notices
            .read()
            .iter()
            .filter(|n| n.event_type().starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, notice: &ProjectionNotice) {
        self.notices.write().push(notice.clone());
    }

    fn try_emit(&self, notice: &ProjectionNotice) {
        self.notices.write().push(notice.clone());
    }
}
