//! Core identifier types for the warpgraph execution engine.
//!
//! This module defines the fundamental identity types used throughout the
//! system: [`NodeKind`] names nodes in the execution graph, and
//! [`ChannelType`] names the channels of the shared state.
//!
//! # Examples
//!
//! ```rust
//! use warpgraph::types::{NodeKind, ChannelType};
//!
//! let agent = NodeKind::Custom("agent".to_string());
//! let terminal = NodeKind::End;
//!
//! assert!(terminal.is_end());
//! assert_eq!(agent.to_string(), "agent");
//!
//! let msg_channel = ChannelType::Message;
//! println!("channel: {}", msg_channel);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within an execution graph.
///
/// `NodeKind` is the routing currency of the engine: static edges, conditional
/// edge targets, and frontier entries are all expressed as `NodeKind` values.
///
/// # The terminal sentinel
///
/// [`NodeKind::End`] is a reserved, virtual target. It is never registered with
/// a capability and never executes; routing to it means "this branch of the run
/// is finished". A run completes when every frontier node has routed to `End`.
///
/// # Examples
///
/// ```rust
/// use warpgraph::types::NodeKind;
///
/// let tools = NodeKind::Custom("tools".to_string());
/// assert!(tools.is_custom());
///
/// // String literals convert for ergonomic builder calls.
/// let same: NodeKind = "tools".into();
/// assert_eq!(tools, same);
///
/// let end: NodeKind = "End".into();
/// assert!(end.is_end());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Reserved terminal sentinel. Routing here removes the source node from
    /// the frontier without scheduling a successor.
    End,

    /// Application node identified by a user-chosen string, unique within a
    /// graph. Common patterns include role names ("agent", "tools") or step
    /// descriptions.
    Custom(String),
}

impl NodeKind {
    /// Returns `true` if this is the terminal sentinel.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is an application node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

// Developer experience: allow string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::from(s.as_str())
    }
}

/// Identifies a channel of the shared state.
///
/// Each channel has a fixed reducer registered for the lifetime of the graph;
/// see [`crate::reducers::ReducerRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Conversation messages. Merged append-with-upsert by message id so that
    /// streamed fragments converge onto one entry instead of duplicating.
    Message,

    /// Error events collected during execution. Append-only.
    Error,

    /// Custom key/value metadata. Merged per key, incoming value overwrites.
    Extra,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "messages"),
            Self::Error => write!(f, "errors"),
            Self::Extra => write!(f, "extra"),
        }
    }
}
