//! Versioned state channels.
//!
//! A channel is a named slice of run state plus a monotonically increasing
//! version number. The barrier bumps a channel's version only when a
//! superstep actually changed its contents, which lets observers (and the
//! `Updates` stream mode) know which channels moved without diffing data.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::channels::errors::ErrorEvent;
use crate::message::Message;

pub mod errors;

/// Common surface shared by all channels.
pub trait Channel {
    type Item;

    /// Current version. Starts at 1 for seeded state and bumps once per
    /// superstep that changed the channel.
    fn version(&self) -> u32;

    /// Overwrites the version. Only the barrier calls this.
    fn set_version(&mut self, version: u32);

    /// Read access to the underlying data.
    fn get(&self) -> &Self::Item;

    /// Mutable access to the underlying data.
    fn get_mut(&mut self) -> &mut Self::Item;
}

/// Append-with-upsert channel holding the conversation transcript.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessagesChannel {
    messages: Vec<Message>,
    version: u32,
}

impl MessagesChannel {
    #[must_use]
    pub fn new(messages: Vec<Message>, version: u32) -> Self {
        Self { messages, version }
    }

    /// Clones out the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Channel for MessagesChannel {
    type Item = Vec<Message>;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get(&self) -> &Vec<Message> {
        &self.messages
    }

    fn get_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }
}

/// Last-writer-wins map of auxiliary values keyed by string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtrasChannel {
    extra: FxHashMap<String, Value>,
    version: u32,
}

impl ExtrasChannel {
    #[must_use]
    pub fn new(extra: FxHashMap<String, Value>, version: u32) -> Self {
        Self { extra, version }
    }

    #[must_use]
    pub fn snapshot(&self) -> FxHashMap<String, Value> {
        self.extra.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extra.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
    }
}

impl Channel for ExtrasChannel {
    type Item = FxHashMap<String, Value>;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get(&self) -> &FxHashMap<String, Value> {
        &self.extra
    }

    fn get_mut(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.extra
    }
}

/// Append-only channel collecting structured failures observed during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorsChannel {
    errors: Vec<ErrorEvent>,
    version: u32,
}

impl ErrorsChannel {
    #[must_use]
    pub fn new(errors: Vec<ErrorEvent>, version: u32) -> Self {
        Self { errors, version }
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ErrorEvent> {
        self.errors.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Channel for ErrorsChannel {
    type Item = Vec<ErrorEvent>;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get(&self) -> &Vec<ErrorEvent> {
        &self.errors
    }

    fn get_mut(&mut self) -> &mut Vec<ErrorEvent> {
        &mut self.errors
    }
}
