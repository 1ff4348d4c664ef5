//! The streaming collaborator the controller reads from and submits to.
//!
//! The collaborator owns the conversation: it accumulates messages and
//! `ui` events, reports loading and error state, and accepts new input.
//! This crate only reads its snapshot and sends submissions.

mod memory;

use crate::errors::ProjectionError;
use crate::events::UiEvent;
use crate::messages::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::InMemoryTransport;

/// What the collaborator currently holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    /// Conversation messages in order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Accumulated `ui` events in order.
    #[serde(default)]
    pub ui: Vec<UiEvent>,
    /// True while a run is streaming.
    #[serde(default)]
    pub is_loading: bool,
    /// Last error message, if the stream failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pending interrupt raised by the agents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt: Option<serde_json::Value>,
}

/// A point in the conversation history a run can resume from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Conversation thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Checkpoint namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_ns: Option<String>,
    /// Checkpoint identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
}

/// Branching information the collaborator keeps per message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Branch the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Sibling branches.
    #[serde(default)]
    pub branch_options: Vec<String>,
    /// Checkpoint preceding the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_checkpoint: Option<Checkpoint>,
}

/// Stream modes requested on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Full state values after each step.
    Values,
}

/// A submission to the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// New messages, or `None` to rerun from `checkpoint`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    /// Checkpoint to resume from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    /// Requested stream modes.
    pub stream_mode: Vec<StreamMode>,
}

impl SubmitRequest {
    /// A submission of new messages.
    #[must_use]
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Some(messages),
            checkpoint: None,
            stream_mode: vec![StreamMode::Values],
        }
    }

    /// A rerun from `checkpoint`.
    #[must_use]
    pub fn rerun(checkpoint: Option<Checkpoint>) -> Self {
        Self {
            messages: None,
            checkpoint,
            stream_mode: vec![StreamMode::Values],
        }
    }
}

/// Connection to the streaming collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Starts a run with `request`.
    ///
    /// Implementations append submitted messages to their message list
    /// before the run produces output.
    async fn submit(&self, request: SubmitRequest) -> Result<(), ProjectionError>;

    /// Stops the current run.
    async fn stop(&self) -> Result<(), ProjectionError>;

    /// Current state of the stream.
    fn snapshot(&self) -> StreamSnapshot;

    /// Branch metadata for a message.
    fn message_metadata(&self, message_id: &str) -> Option<MessageMetadata>;
}
