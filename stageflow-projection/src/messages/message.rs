//! Message types as delivered by the streaming collaborator.

use serde::{Deserialize, Serialize};

/// `additional_kwargs` key that hides a message from display.
pub const DO_NOT_RENDER_FLAG: &str = "do_not_render";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageRole {
    /// The user.
    #[serde(rename = "human")]
    Human,
    /// The assistant.
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
    /// A tool result.
    #[serde(rename = "tool")]
    Tool,
}

/// Message body: plain text or structured content parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Structured parts (images, tool blocks, ...).
    Parts(Vec<serde_json::Value>),
}

impl MessageContent {
    /// The text, when the content is plain text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(_) => None,
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Producer role.
    #[serde(rename = "type")]
    pub role: MessageRole,
    /// Message body.
    pub content: MessageContent,
    /// Extra flags attached by the producer.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_kwargs: serde_json::Map<String, serde_json::Value>,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call answered by a tool message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name for tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: MessageRole, id: Option<String>, content: MessageContent) -> Self {
        Self {
            id,
            role,
            content,
            additional_kwargs: serde_json::Map::new(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// A user message.
    #[must_use]
    pub fn human(id: impl Into<String>, text: &str) -> Self {
        Self::new(MessageRole::Human, Some(id.into()), text.into())
    }

    /// An assistant message.
    #[must_use]
    pub fn assistant(id: impl Into<String>, text: &str) -> Self {
        Self::new(MessageRole::Assistant, Some(id.into()), text.into())
    }

    /// A tool result answering `tool_call_id`.
    #[must_use]
    pub fn tool(id: impl Into<String>, tool_call_id: impl Into<String>, text: &str) -> Self {
        let mut message = Self::new(MessageRole::Tool, Some(id.into()), text.into());
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    /// Adds a tool call.
    #[must_use]
    pub fn with_tool_call(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.tool_calls.push(ToolCall {
            id: Some(id.into()),
            name: name.into(),
            args: serde_json::Value::Object(serde_json::Map::new()),
        });
        self
    }

    /// Sets an `additional_kwargs` flag.
    #[must_use]
    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.additional_kwargs
            .insert(key.into(), serde_json::Value::Bool(value));
        self
    }

    /// Returns true if the producer flagged the message as hidden.
    #[must_use]
    pub fn is_flagged_hidden(&self) -> bool {
        self.additional_kwargs
            .get(DO_NOT_RENDER_FLAG)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
