//! Versioned run state and read-only snapshots.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::channels::errors::ErrorEvent;
use crate::channels::{Channel, ErrorsChannel, ExtrasChannel, MessagesChannel};
use crate::message::Message;
use crate::utils::collections::new_extra_map;

/// The complete state of a run: three channels, each with its own version.
///
/// Nodes never see this type directly. The scheduler hands each node a
/// [`StateSnapshot`] taken at the start of the superstep, and the barrier is
/// the only code that mutates the channels between supersteps.
#[derive(Clone, Debug, Default)]
pub struct VersionedState {
    pub messages: MessagesChannel,
    pub extra: ExtrasChannel,
    pub errors: ErrorsChannel,
}

impl VersionedState {
    /// Seeds state with a single user message. Channel versions start at 1.
    #[must_use]
    pub fn new_with_user_message(content: &str) -> Self {
        Self::new_with_messages(vec![Message::user(content)])
    }

    /// Seeds state with an initial transcript. Channel versions start at 1.
    #[must_use]
    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: MessagesChannel::new(messages, 1),
            extra: ExtrasChannel::new(new_extra_map(), 1),
            errors: ErrorsChannel::new(Vec::new(), 1),
        }
    }

    /// Fluent construction for more involved seeds.
    #[must_use]
    pub fn builder() -> VersionedStateBuilder {
        VersionedStateBuilder::default()
    }

    /// Appends a message outside the barrier. Intended for seeding and tests;
    /// does not bump the channel version.
    pub fn add_message(&mut self, message: Message) {
        self.messages.get_mut().push(message);
    }

    /// Sets an extras entry outside the barrier. Intended for seeding and
    /// tests; does not bump the channel version.
    pub fn add_extra(&mut self, key: impl Into<String>, value: Value) {
        self.extra.get_mut().insert(key.into(), value);
    }

    /// Captures an immutable view of all channels for a superstep.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.snapshot(),
            messages_version: self.messages.version(),
            extra: self.extra.snapshot(),
            extra_version: self.extra.version(),
            errors: self.errors.snapshot(),
            errors_version: self.errors.version(),
        }
    }
}

/// Point-in-time copy of run state handed to nodes and edge predicates.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub messages_version: u32,
    pub extra: FxHashMap<String, Value>,
    pub extra_version: u32,
    pub errors: Vec<ErrorEvent>,
    pub errors_version: u32,
}

impl StateSnapshot {
    /// The most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Pending tool calls on the newest message, or empty if the newest
    /// message requests none.
    #[must_use]
    pub fn pending_tool_calls(&self) -> &[crate::message::ToolCall] {
        self.last_message()
            .map(|m| m.pending_tool_calls())
            .unwrap_or(&[])
    }
}

/// Builder for [`VersionedState`].
#[derive(Debug, Default)]
pub struct VersionedStateBuilder {
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
}

impl VersionedStateBuilder {
    #[must_use]
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    #[must_use]
    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    #[must_use]
    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> VersionedState {
        VersionedState {
            messages: MessagesChannel::new(self.messages, 1),
            extra: ExtrasChannel::new(self.extra, 1),
            errors: ErrorsChannel::new(Vec::new(), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use serde_json::json;

    #[test]
    fn seeded_state_starts_at_version_one() {
        let state = VersionedState::new_with_user_message("hello");
        assert_eq!(state.messages.version(), 1);
        assert_eq!(state.extra.version(), 1);
        assert_eq!(state.errors.version(), 1);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_state() {
        let mut state = VersionedState::new_with_user_message("hello");
        let snap = state.snapshot();
        state.add_message(Message::assistant("hi"));
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn pending_tool_calls_reads_newest_message_only() {
        let state = VersionedState::builder()
            .with_message(
                Message::assistant("").with_tool_calls(vec![ToolCall::new(
                    "c0",
                    "old",
                    json!({}),
                )]),
            )
            .with_user_message("follow-up")
            .build();
        assert!(state.snapshot().pending_tool_calls().is_empty());
    }

    #[test]
    fn builder_collects_messages_and_extras() {
        let state = VersionedState::builder()
            .with_system_message("sys")
            .with_user_message("hi")
            .with_extra("k", json!(1))
            .build();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.extra.len(), 1);
    }
}
