//! Conversational messages and their display projection.

mod filter;
mod message;
mod tool_responses;

pub use filter::MessageFilter;
pub use message::{Message, MessageContent, MessageRole, ToolCall, DO_NOT_RENDER_FLAG};
pub use tool_responses::{ensure_tool_calls_have_responses, TOOL_RESPONSE_PLACEHOLDER};
