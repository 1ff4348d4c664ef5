//! De-duplication and hiding of messages before display.

use crate::config::ProjectionConfig;
use crate::messages::{Message, MessageRole};
use std::collections::HashSet;
use tracing::debug;

/// Projects a message history onto what the display should show.
///
/// The projection is a pure function of the whole history, so it can be
/// recomputed on every snapshot the transport redelivers.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    do_not_render_prefix: String,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self::new(ProjectionConfig::default().do_not_render_prefix)
    }
}

impl MessageFilter {
    /// Creates a filter hiding ids that start with `do_not_render_prefix`.
    #[must_use]
    pub fn new(do_not_render_prefix: impl Into<String>) -> Self {
        Self {
            do_not_render_prefix: do_not_render_prefix.into(),
        }
    }

    /// Creates a filter from configuration.
    #[must_use]
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(config.do_not_render_prefix.clone())
    }

    /// Returns the messages to display, in order.
    ///
    /// 1. Human messages always survive de-duplication.
    /// 2. Any other message is dropped when an earlier message had the
    ///    same text content. Only plain-text content takes part.
    /// 3. Messages with a reserved id prefix or the hidden flag are dropped.
    #[must_use]
    pub fn project(&self, messages: &[Message]) -> Vec<Message> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::with_capacity(messages.len());

        for message in messages {
            let text = message.content.as_text();
            let duplicate = message.role != MessageRole::Human
                && text.is_some_and(|t| seen.contains(t));
            if let Some(t) = text {
                seen.insert(t);
            }
            if duplicate {
                debug!(message_id = ?message.id, "Dropping replayed message");
                continue;
            }
            if self.is_hidden(message) {
                debug!(message_id = ?message.id, "Dropping hidden message");
                continue;
            }
            out.push(message.clone());
        }
        out
    }

    /// Returns true if the message must never be displayed.
    #[must_use]
    pub fn is_hidden(&self, message: &Message) -> bool {
        let reserved_id = message
            .id
            .as_deref()
            .is_some_and(|id| id.starts_with(&self.do_not_render_prefix));
        reserved_id || message.is_flagged_hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MessageContent, DO_NOT_RENDER_FLAG};
    use pretty_assertions::assert_eq;

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().filter_map(|m| m.id.as_deref()).collect()
    }

    #[test]
    fn test_replayed_assistant_message_is_dropped() {
        let messages = vec![
            Message::human("A", "hi"),
            Message::assistant("B", "x"),
            Message::assistant("C", "x"),
        ];
        let projected = MessageFilter::default().project(&messages);
        assert_eq!(ids(&projected), vec!["A", "B"]);
    }

    #[test]
    fn test_human_messages_are_never_deduplicated() {
        let messages = vec![
            Message::human("A", "again"),
            Message::human("B", "again"),
        ];
        assert_eq!(ids(&MessageFilter::default().project(&messages)), vec!["A", "B"]);
    }

    #[test]
    fn test_assistant_echo_of_earlier_text_is_dropped() {
        let messages = vec![Message::human("A", "ok"), Message::assistant("B", "ok")];
        assert_eq!(ids(&MessageFilter::default().project(&messages)), vec!["A"]);
    }

    #[test]
    fn test_structured_content_is_not_deduplicated() {
        let mut first = Message::assistant("A", "");
        first.content = MessageContent::Parts(vec![serde_json::json!({"type": "image"})]);
        let second = Message {
            id: Some("B".into()),
            ..first.clone()
        };
        let projected = MessageFilter::default().project(&[first, second]);
        assert_eq!(ids(&projected), vec!["A", "B"]);
    }

    #[test]
    fn test_reserved_prefix_and_flag_are_hidden() {
        let messages = vec![
            Message::human("A", "start"),
            Message::tool("do-not-render-123", "call-1", "Successfully handled tool call."),
            Message::human("B", "quiet").with_flag(DO_NOT_RENDER_FLAG, true),
            Message::assistant("C", "visible"),
        ];
        let projected = MessageFilter::default().project(&messages);
        assert_eq!(ids(&projected), vec!["A", "C"]);
    }

    #[test]
    fn test_custom_prefix() {
        let filter = MessageFilter::new("hidden:");
        let messages = vec![
            Message::assistant("hidden:1", "a"),
            Message::assistant("do-not-render-2", "b"),
        ];
        assert_eq!(ids(&filter.project(&messages)), vec!["do-not-render-2"]);
    }

    #[test]
    fn test_projection_is_stable_under_recompute() {
        let messages = vec![
            Message::human("A", "hi"),
            Message::assistant("B", "x"),
            Message::assistant("C", "x"),
            Message::assistant("D", "y"),
        ];
        let filter = MessageFilter::default();
        let once = filter.project(&messages);
        assert_eq!(filter.project(&messages), once);
    }
}
