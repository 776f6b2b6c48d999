//! Event types flowing through the bus during a run.

use std::fmt;

use crate::node::NodePartial;
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Diagnostic scope used for the final event of every run.
pub const RUN_END_SCOPE: &str = "runner:run_end";

/// Everything observable about a run, in emission order.
///
/// The hub broadcasts every event; [`StreamMode`] decides which of them a
/// given subscriber sees.
#[derive(Clone, Debug)]
pub enum Event {
    /// Node lifecycle and custom node-emitted events.
    Node(NodeEvent),
    /// One streamed fragment from a streaming node, in production order.
    Stream(StreamFragmentEvent),
    /// A node's folded partial, emitted when the barrier commits it.
    Update(StateUpdateEvent),
    /// Final state snapshot of a completed run.
    Values(ValuesEvent),
    /// Runner and scheduler diagnostics, including run start and end.
    Diagnostic(DiagnosticEvent),
}

#[derive(Clone, Debug)]
pub struct NodeEvent {
    pub node: NodeKind,
    pub step: u64,
    pub label: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct StreamFragmentEvent {
    /// Node that produced this fragment.
    pub node: NodeKind,
    pub step: u64,
    /// Position of the fragment in the node's own sequence, from 0.
    pub seq: u64,
    pub fragment: NodePartial,
}

#[derive(Clone, Debug)]
pub struct StateUpdateEvent {
    pub node: NodeKind,
    pub step: u64,
    pub update: NodePartial,
}

#[derive(Clone, Debug)]
pub struct ValuesEvent {
    pub step: u64,
    pub snapshot: StateSnapshot,
}

#[derive(Clone, Debug)]
pub struct DiagnosticEvent {
    pub scope: String,
    pub message: String,
}

impl Event {
    /// Emits a node lifecycle event with an empty message.
    #[must_use]
    pub fn node_lifecycle(node: NodeKind, step: u64, label: &str) -> Self {
        Event::Node(NodeEvent {
            node,
            step,
            label: label.to_string(),
            message: String::new(),
        })
    }

    #[must_use]
    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// Short label describing where the event came from.
    #[must_use]
    pub fn scope_label(&self) -> String {
        match self {
            Event::Node(e) => format!("node:{}", e.node),
            Event::Stream(e) => format!("stream:{}", e.node),
            Event::Update(e) => format!("update:{}", e.node),
            Event::Values(e) => format!("values:step{}", e.step),
            Event::Diagnostic(e) => e.scope.clone(),
        }
    }

    /// Human-readable payload summary.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Event::Node(e) if e.message.is_empty() => e.label.clone(),
            Event::Node(e) => format!("{}: {}", e.label, e.message),
            Event::Stream(e) => format!("fragment #{} (step {})", e.seq, e.step),
            Event::Update(e) => format!("update committed (step {})", e.step),
            Event::Values(e) => {
                format!("{} messages after step {}", e.snapshot.messages.len(), e.step)
            }
            Event::Diagnostic(e) => e.message.clone(),
        }
    }

    /// True when this event marks the end of a run.
    #[must_use]
    pub fn is_run_end(&self) -> bool {
        matches!(self, Event::Diagnostic(e) if e.scope == RUN_END_SCOPE)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scope_label(), self.message())
    }
}

/// What a subscriber wants to see on its event stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamMode {
    /// Only [`Event::Values`]: the final state once the run completes.
    Values,
    /// Only [`Event::Update`]: per-node partials as they commit.
    Updates,
    /// Every event, interleaved in emission order.
    #[default]
    Events,
}

impl StreamMode {
    /// Whether `event` passes this mode's filter. Run-end diagnostics pass
    /// every filter so subscribers always observe termination.
    #[must_use]
    pub fn admits(&self, event: &Event) -> bool {
        if event.is_run_end() {
            return true;
        }
        match self {
            StreamMode::Values => matches!(event, Event::Values(_)),
            StreamMode::Updates => matches!(event, Event::Update(_)),
            StreamMode::Events => true,
        }
    }
}
