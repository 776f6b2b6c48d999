//! Conversation messages and tool-call payloads.
//!
//! Messages are the primary data flowing through a run: user input, assistant
//! turns (possibly carrying pending tool calls), system prompts, and tool
//! results. Every message has a stable `id`, which is what the messages
//! channel's append-with-upsert reducer keys on: a streaming node re-emits
//! the same id with more content and the channel converges onto one entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::id_generator::IdGenerator;

/// A tool invocation requested by an assistant message.
///
/// The `id` is the correlation key: the tool result message produced for this
/// call carries the same value in its `tool_call_id` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, unique within the conversation.
    pub id: String,
    /// Name of the tool to invoke; resolved against a tool registry.
    pub name: String,
    /// JSON arguments for the tool.
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// A message in a conversation.
///
/// # Examples
///
/// ```
/// use warpgraph::message::{Message, ToolCall};
/// use serde_json::json;
///
/// let user = Message::user("what is the weather in sf");
/// assert!(user.has_role(Message::USER));
/// assert!(user.pending_tool_calls().is_empty());
///
/// let call = ToolCall::new("c1", "search", json!({"query": "weather in SF"}));
/// let assistant = Message::assistant("").with_tool_calls(vec![call]);
/// assert_eq!(assistant.pending_tool_calls().len(), 1);
///
/// let result = Message::tool("c1", "Cloudy with a chance of hail.");
/// assert_eq!(result.tool_call_id.as_deref(), Some("c1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity used by the messages channel for in-place upserts.
    pub id: String,
    /// Role of the sender; use the constants on [`Message`].
    pub role: String,
    /// Text content.
    pub content: String,
    /// Tool calls this message requests. Only meaningful on assistant turns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool-result messages, the id of the call this answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// Assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt message role.
    pub const SYSTEM: &'static str = "system";
    /// Tool result message role.
    pub const TOOL: &'static str = "tool";

    /// Creates a message with a freshly generated id.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            id: IdGenerator::new().generate_message_id(),
            role: role.to_string(),
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a message with an explicit id.
    ///
    /// Streaming producers use this to re-emit the same logical message as
    /// its content accumulates.
    #[must_use]
    pub fn with_id(id: impl Into<String>, role: &str, content: &str) -> Self {
        Self {
            id: id.into(),
            role: role.to_string(),
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool-result message correlated to `call_id`.
    #[must_use]
    pub fn tool(call_id: impl Into<String>, content: &str) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(Self::TOOL, content)
        }
    }

    /// Attaches pending tool calls, builder style.
    #[must_use]
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Tool calls awaiting execution on this message.
    #[must_use]
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn convenience_constructors_set_roles() {
        assert_eq!(Message::user("hi").role, Message::USER);
        assert_eq!(Message::assistant("hello").role, Message::ASSISTANT);
        assert_eq!(Message::system("be helpful").role, Message::SYSTEM);
        assert_eq!(Message::tool("c1", "42").role, Message::TOOL);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Message::user("x");
        let b = Message::user("x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn tool_message_carries_call_id() {
        let msg = Message::tool("call-7", "done");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call-7"));
        assert!(msg.pending_tool_calls().is_empty());
    }

    #[test]
    fn serialization_roundtrip() {
        let msg = Message::assistant("").with_tool_calls(vec![ToolCall::new(
            "c1",
            "search",
            json!({"query": "weather"}),
        )]);
        let json = serde_json::to_string(&msg).expect("serialize");
        let parsed: Message = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(msg, parsed);
    }
}
