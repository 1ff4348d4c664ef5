//! Wire events from the agent stream and their classified form.

use crate::core::{CodeFile, DeploymentInfo, Story, TestCase};
use crate::errors::ProjectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Stage-shaped data attached to an event.
///
/// Every field is optional; absent fields never clear stored payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StageData {
    /// User stories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<Vec<Story>>,
    /// Markdown design text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_content: Option<String>,
    /// Generated file tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_files: Option<Vec<CodeFile>>,
    /// Test cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_cases: Option<Vec<TestCase>>,
    /// Generated test sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_files: Option<Vec<CodeFile>>,
    /// Deployment record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_info: Option<DeploymentInfo>,
}

/// A raw event as found in the collaborator's `ui` value list.
///
/// `props` is kept loosely typed; [`EventClassifier`] extracts the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    /// Event identifier, when the producer assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Envelope type, always `"ui"` in practice.
    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: String,
    /// Declared kind (`progress`, `content_ready`, `ai_response`).
    pub name: String,
    /// Event properties.
    #[serde(default)]
    pub props: serde_json::Map<String, serde_json::Value>,
    /// Producer metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

fn default_event_type() -> String {
    "ui".to_string()
}

impl UiEvent {
    /// Creates an event with the given kind name and no props.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            event_type: default_event_type(),
            name: name.into(),
            props: serde_json::Map::new(),
            metadata: None,
        }
    }

    /// Sets the event id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a prop.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Sets `props.agent_name`.
    #[must_use]
    pub fn with_agent(self, agent: &str) -> Self {
        self.with_prop("agent_name", serde_json::json!(agent))
    }

    /// Sets `props.content`.
    #[must_use]
    pub fn with_content(self, content: &str) -> Self {
        self.with_prop("content", serde_json::json!(content))
    }

    /// Sets `props.progress`.
    #[must_use]
    pub fn with_progress(self, progress: u8) -> Self {
        self.with_prop("progress", serde_json::json!(progress))
    }

    /// Sets `props.stage_data`.
    #[must_use]
    pub fn with_stage_data(self, data: &StageData) -> Self {
        let value = serde_json::to_value(data).unwrap_or(serde_json::Value::Null);
        self.with_prop("stage_data", value)
    }
}

/// Declared kind of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Incremental progress for a stage.
    Progress,
    /// Stage output is ready; the stage is complete.
    ContentReady,
    /// Free-text agent response, optionally with progress.
    AiResponse,
}

impl EventKind {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::ContentReady => "content_ready",
            Self::AiResponse => "ai_response",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "progress" => Ok(Self::Progress),
            "content_ready" => Ok(Self::ContentReady),
            "ai_response" => Ok(Self::AiResponse),
            other => Err(ProjectionError::UnrecognizedEvent(other.to_string())),
        }
    }
}

/// A classified event with its common fields extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowEvent {
    /// Producer-assigned id, if any.
    pub id: Option<String>,
    /// Declared kind.
    pub kind: EventKind,
    /// Agent that emitted the event, as sent.
    pub agent_id: String,
    /// Free-text content.
    pub content: Option<String>,
    /// Progress, clamped to 0-100.
    pub progress: Option<u8>,
    /// Stage-shaped payload.
    pub payload: Option<StageData>,
}

impl WorkflowEvent {
    /// Key used to recognise replays of the same logical event.
    ///
    /// The producer id when present, otherwise `content-agent`.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{}-{}",
                self.content.as_deref().unwrap_or_default(),
                self.agent_id
            ),
        }
    }
}

/// Raw events split by declared kind, arrival order preserved.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedEvents {
    /// `progress` events.
    pub progress: Vec<WorkflowEvent>,
    /// `content_ready` events.
    pub content_ready: Vec<WorkflowEvent>,
    /// `ai_response` events.
    pub ai_response: Vec<WorkflowEvent>,
}

/// Turns raw [`UiEvent`]s into [`WorkflowEvent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventClassifier;

impl EventClassifier {
    /// Classifies one event.
    ///
    /// Fails with `UnrecognizedEvent` for an unknown kind and with
    /// `MalformedEvent` when no agent identifier is present. Unusable
    /// optional fields are dropped rather than failing the event.
    pub fn classify(event: &UiEvent) -> Result<WorkflowEvent, ProjectionError> {
        let kind: EventKind = event.name.parse()?;

        let agent_id = event
            .props
            .get("agent_name")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ProjectionError::malformed("missing agent_name"))?
            .to_string();

        let content = event
            .props
            .get("content")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);

        let progress = event.props.get("progress").and_then(parse_progress);

        let payload = match event.props.get("stage_data") {
            None | Some(serde_json::Value::Null) => None,
            Some(raw) => match serde_json::from_value::<StageData>(raw.clone()) {
                Ok(data) => Some(data),
                Err(err) => {
                    warn!(agent = %agent_id, error = %err, "Ignoring unreadable stage_data");
                    None
                }
            },
        };

        Ok(WorkflowEvent {
            id: event.id.clone(),
            kind,
            agent_id,
            content,
            progress,
            payload,
        })
    }

    /// Classifies a batch and buckets the results by kind.
    ///
    /// Events that fail classification are left out.
    #[must_use]
    pub fn partition(events: &[UiEvent]) -> ClassifiedEvents {
        let mut out = ClassifiedEvents::default();
        for event in events.iter().filter_map(|e| Self::classify(e).ok()) {
            match event.kind {
                EventKind::Progress => out.progress.push(event),
                EventKind::ContentReady => out.content_ready.push(event),
                EventKind::AiResponse => out.ai_response.push(event),
            }
        }
        out
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_progress(value: &serde_json::Value) -> Option<u8> {
    let raw = value.as_f64()?;
    if raw.is_nan() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_event_deserialize() {
        let event: UiEvent = serde_json::from_value(json!({
            "id": "evt-1",
            "type": "ui",
            "name": "content_ready",
            "props": {
                "agent_name": "code_developer",
                "content": "done",
                "stage_data": { "codeFiles": [{ "id": "f1", "name": "main.rs", "path": "/main.rs", "type": "file" }] }
            },
            "metadata": { "run_id": "r1" }
        }))
        .unwrap();

        let classified = EventClassifier::classify(&event).unwrap();
        assert_eq!(classified.kind, EventKind::ContentReady);
        assert_eq!(classified.agent_id, "code_developer");
        assert_eq!(classified.content.as_deref(), Some("done"));
        let files = classified.payload.and_then(|p| p.code_files).unwrap();
        assert_eq!(files[0].name, "main.rs");
    }

    #[test]
    fn test_missing_agent_is_malformed() {
        let event = UiEvent::new("progress").with_progress(10);
        assert!(matches!(
            EventClassifier::classify(&event),
            Err(ProjectionError::MalformedEvent { .. })
        ));

        let blank = UiEvent::new("progress").with_agent("   ");
        assert!(EventClassifier::classify(&blank).is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let event = UiEvent::new("heartbeat").with_agent("story_writer");
        assert!(matches!(
            EventClassifier::classify(&event),
            Err(ProjectionError::UnrecognizedEvent(name)) if name == "heartbeat"
        ));
    }

    #[test]
    fn test_progress_is_clamped() {
        let over = UiEvent::new("progress")
            .with_agent("a")
            .with_prop("progress", json!(140.2));
        assert_eq!(EventClassifier::classify(&over).unwrap().progress, Some(100));

        let under = UiEvent::new("progress")
            .with_agent("a")
            .with_prop("progress", json!(-3));
        assert_eq!(EventClassifier::classify(&under).unwrap().progress, Some(0));

        let fractional = UiEvent::new("progress")
            .with_agent("a")
            .with_prop("progress", json!(42.6));
        assert_eq!(
            EventClassifier::classify(&fractional).unwrap().progress,
            Some(43)
        );
    }

    #[test]
    fn test_non_numeric_progress_is_dropped() {
        let event = UiEvent::new("progress")
            .with_agent("a")
            .with_prop("progress", json!("forty"));
        let classified = EventClassifier::classify(&event).unwrap();
        assert_eq!(classified.progress, None);
    }

    #[test]
    fn test_unreadable_stage_data_is_dropped() {
        let event = UiEvent::new("content_ready")
            .with_agent("story_writer")
            .with_prop("stage_data", json!({ "stories": "not a list" }));
        let classified = EventClassifier::classify(&event).unwrap();
        assert!(classified.payload.is_none());
    }

    #[test]
    fn test_partition_preserves_order() {
        let events = vec![
            UiEvent::new("progress").with_agent("a").with_progress(10),
            UiEvent::new("ai_response").with_agent("a").with_content("hi"),
            UiEvent::new("progress").with_agent("b").with_progress(20),
            UiEvent::new("progress"),
            UiEvent::new("content_ready").with_agent("b"),
        ];
        let buckets = EventClassifier::partition(&events);
        assert_eq!(buckets.progress.len(), 2);
        assert_eq!(buckets.progress[1].agent_id, "b");
        assert_eq!(buckets.ai_response.len(), 1);
        assert_eq!(buckets.content_ready.len(), 1);
    }

    #[test]
    fn test_dedup_key() {
        let with_id = EventClassifier::classify(
            &UiEvent::new("ai_response").with_id("x1").with_agent("a"),
        )
        .unwrap();
        assert_eq!(with_id.dedup_key(), "x1");

        let without_id = EventClassifier::classify(
            &UiEvent::new("ai_response").with_agent("a").with_content("hello"),
        )
        .unwrap();
        assert_eq!(without_id.dedup_key(), "hello-a");
    }
}
