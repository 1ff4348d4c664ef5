//! In-process transport that records submissions.

use super::{MessageMetadata, StreamSnapshot, StreamTransport, SubmitRequest};
use crate::errors::ProjectionError;
use crate::events::UiEvent;
use crate::messages::Message;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct State {
    snapshot: StreamSnapshot,
    submissions: Vec<SubmitRequest>,
    stop_count: usize,
    fail_next: Option<String>,
    metadata: HashMap<String, MessageMetadata>,
}

/// A transport backed by memory.
///
/// Tests and the demo drive it by pushing events and messages; the
/// controller sees them through [`StreamTransport::snapshot`].
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: Mutex<State>,
}

impl InMemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `ui` event.
    pub fn push_event(&self, event: UiEvent) {
        self.state.lock().snapshot.ui.push(event);
    }

    /// Appends a message.
    pub fn push_message(&self, message: Message) {
        self.state.lock().snapshot.messages.push(message);
    }

    /// Drops every `ui` event, as when a new thread starts.
    pub fn clear_events(&self) {
        self.state.lock().snapshot.ui.clear();
    }

    /// Sets the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.state.lock().snapshot.is_loading = loading;
    }

    /// Sets or clears the stream error.
    pub fn set_error(&self, error: Option<&str>) {
        self.state.lock().snapshot.error = error.map(ToString::to_string);
    }

    /// Stores metadata for a message.
    pub fn set_metadata(&self, message_id: impl Into<String>, metadata: MessageMetadata) {
        self.state.lock().metadata.insert(message_id.into(), metadata);
    }

    /// Makes the next submission fail with `reason`.
    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        self.state.lock().fail_next = Some(reason.into());
    }

    /// Submissions received so far.
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmitRequest> {
        self.state.lock().submissions.clone()
    }

    /// Number of stop requests received.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.state.lock().stop_count
    }
}

#[async_trait]
impl StreamTransport for InMemoryTransport {
    async fn submit(&self, request: SubmitRequest) -> Result<(), ProjectionError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next.take() {
            return Err(ProjectionError::transport(reason));
        }
        if let Some(messages) = &request.messages {
            state.snapshot.messages.extend(messages.iter().cloned());
        }
        state.snapshot.is_loading = true;
        state.snapshot.error = None;
        state.submissions.push(request);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProjectionError> {
        let mut state = self.state.lock();
        state.snapshot.is_loading = false;
        state.stop_count += 1;
        Ok(())
    }

    fn snapshot(&self) -> StreamSnapshot {
        self.state.lock().snapshot.clone()
    }

    fn message_metadata(&self, message_id: &str) -> Option<MessageMetadata> {
        self.state.lock().metadata.get(message_id).cloned()
    }
}
