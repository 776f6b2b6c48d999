//! Node traits, partial updates, and the per-invocation context.
//!
//! Nodes are the units of work in a graph. A node never mutates shared state:
//! it reads a [`StateSnapshot`] and returns a [`NodePartial`] describing what
//! it wants changed. The barrier merges partials into the run state between
//! supersteps.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::channels::errors::ErrorEvent;
use crate::event_bus::{EmitterError, Event, EventEmitter, NodeEvent};
use crate::message::Message;
use crate::reducers::add_messages::upsert_messages;
use crate::runtime::config::RunConfig;
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Partial state update produced by one node invocation.
///
/// `None` fields mean "no opinion" and leave the channel untouched; an empty
/// collection is an explicit no-op write that still merges cleanly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePartial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<FxHashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorEvent>>,
}

impl NodePartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: FxHashMap<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// True when no channel has an update.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_none() && self.extra.is_none() && self.errors.is_none()
    }

    /// Folds a later fragment into this partial.
    ///
    /// Messages merge by upsert on id, extras overwrite per key, errors
    /// append. Folding a fragment sequence f1..fn in order yields the same
    /// result as applying each fragment through the channel reducers.
    pub fn merge(&mut self, later: NodePartial) {
        if let Some(incoming) = later.messages {
            let base = self.messages.get_or_insert_with(Vec::new);
            upsert_messages(base, incoming);
        }
        if let Some(incoming) = later.extra {
            self.extra.get_or_insert_with(FxHashMap::default).extend(incoming);
        }
        if let Some(incoming) = later.errors {
            self.errors.get_or_insert_with(Vec::new).extend(incoming);
        }
    }
}

/// Error returned by a node body.
///
/// The scheduler records it on the errors channel, the superstep's barrier
/// still commits, and then the run fails with the error attached.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    #[error("missing expected input: {what}")]
    #[diagnostic(code(warpgraph::node::missing_input))]
    MissingInput { what: &'static str },

    #[error("provider {provider} failed: {message}")]
    #[diagnostic(code(warpgraph::node::provider))]
    Provider { provider: String, message: String },

    #[error("invalid node output: {0}")]
    #[diagnostic(code(warpgraph::node::validation))]
    ValidationFailed(String),

    #[error("serialization error")]
    #[diagnostic(code(warpgraph::node::serde))]
    Serde(#[from] serde_json::Error),

    #[error("event bus unavailable")]
    #[diagnostic(code(warpgraph::node::event_bus))]
    EventBus(#[from] EmitterError),
}

/// Execution context handed to each node invocation.
///
/// Carries identity (which node, which step), the run's configuration so
/// nested capability calls stay attributable to the originating run, and a
/// handle for emitting custom events onto the run's event stream.
#[derive(Clone)]
pub struct NodeContext {
    pub node: NodeKind,
    pub step: u64,
    pub config: RunConfig,
    emitter: Arc<dyn EventEmitter>,
}

impl NodeContext {
    #[must_use]
    pub fn new(
        node: NodeKind,
        step: u64,
        config: RunConfig,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            node,
            step,
            config,
            emitter,
        }
    }

    /// Id of the run this invocation belongs to.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.config.run_id
    }

    /// Emits a labelled event attributed to this node and step.
    pub fn emit(
        &self,
        label: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), EmitterError> {
        self.emitter.emit(Event::Node(NodeEvent {
            node: self.node.clone(),
            step: self.step,
            label: label.into(),
            message: message.into(),
        }))
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("node", &self.node)
            .field("step", &self.step)
            .field("run_id", &self.run_id())
            .finish_non_exhaustive()
    }
}

/// A node that produces its whole update in one shot.
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError>;
}

/// Stream of incremental fragments from a streaming node.
pub type FragmentStream = BoxStream<'static, Result<NodePartial, NodeError>>;

/// A node that yields its update as a sequence of fragments.
///
/// Fragments surface on the event stream in production order as they arrive;
/// the scheduler folds them (via [`NodePartial::merge`]) into the single
/// partial the barrier applies.
#[async_trait]
pub trait StreamingNode: Send + Sync {
    async fn stream(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<FragmentStream, NodeError>;
}

/// How a registered node executes.
#[derive(Clone)]
pub enum Capability {
    /// One `run` call returning a complete partial.
    Direct(Arc<dyn Node>),
    /// A `stream` call returning fragments.
    Streaming(Arc<dyn StreamingNode>),
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Direct(_) => f.write_str("Direct"),
            Capability::Streaming(_) => f.write_str("Streaming"),
        }
    }
}
