//! Event and message fixtures.

use crate::events::{EventKind, StageData, UiEvent, WorkflowEvent};
use crate::messages::Message;

/// A classified `progress` event.
#[must_use]
pub fn progress(agent: &str, progress: u8) -> WorkflowEvent {
    WorkflowEvent {
        id: None,
        kind: EventKind::Progress,
        agent_id: agent.to_string(),
        content: None,
        progress: Some(progress),
        payload: None,
    }
}

/// A classified `content_ready` event carrying `data`.
#[must_use]
pub fn content_ready(agent: &str, data: StageData) -> WorkflowEvent {
    WorkflowEvent {
        id: None,
        kind: EventKind::ContentReady,
        agent_id: agent.to_string(),
        content: None,
        progress: None,
        payload: Some(data),
    }
}

/// A classified `ai_response` event.
#[must_use]
pub fn ai_response(agent: &str, content: &str, progress: Option<u8>) -> WorkflowEvent {
    WorkflowEvent {
        id: None,
        kind: EventKind::AiResponse,
        agent_id: agent.to_string(),
        content: Some(content.to_string()),
        progress,
        payload: None,
    }
}

/// A wire `progress` event.
#[must_use]
pub fn progress_event(agent: &str, progress: u8) -> UiEvent {
    UiEvent::new("progress")
        .with_agent(agent)
        .with_progress(progress)
}

/// A wire `content_ready` event.
#[must_use]
pub fn content_ready_event(agent: &str, data: &StageData) -> UiEvent {
    UiEvent::new("content_ready")
        .with_agent(agent)
        .with_stage_data(data)
}

/// A wire `ai_response` event without progress.
#[must_use]
pub fn ai_response_event(agent: &str, content: &str) -> UiEvent {
    UiEvent::new("ai_response")
        .with_agent(agent)
        .with_content(content)
}

/// A short conversation: one user turn and two assistant replies with the
/// same text, as a replayed snapshot would deliver them.
#[must_use]
pub fn replayed_conversation() -> Vec<Message> {
    vec![
        Message::human("h1", "hi"),
        Message::assistant("a1", "x"),
        Message::assistant("a2", "x"),
    ]
}
