//! Synthetic tool results for unanswered tool calls.

use crate::messages::{Message, MessageRole};

/// Content of a synthetic tool result.
pub const TOOL_RESPONSE_PLACEHOLDER: &str = "Successfully handled tool call.";

/// Builds tool messages for assistant tool calls that were never answered.
///
/// An assistant message with tool calls counts as answered when the next
/// message is a tool message. The returned messages carry ids starting
/// with `do_not_render_prefix` so the display filter hides them.
#[must_use]
pub fn ensure_tool_calls_have_responses(
    messages: &[Message],
    do_not_render_prefix: &str,
) -> Vec<Message> {
    let mut responses = Vec::new();

    for (index, message) in messages.iter().enumerate() {
        if message.role != MessageRole::Assistant || message.tool_calls.is_empty() {
            continue;
        }
        let answered = messages
            .get(index + 1)
            .is_some_and(|next| next.role == MessageRole::Tool);
        if answered {
            continue;
        }

        for call in &message.tool_calls {
            let mut response = Message::tool(
                format!("{do_not_render_prefix}{}", uuid::Uuid::new_v4()),
                call.id.clone().unwrap_or_default(),
                TOOL_RESPONSE_PLACEHOLDER,
            );
            response.name = Some(call.name.clone());
            responses.push(response);
        }
    }
    responses
}
