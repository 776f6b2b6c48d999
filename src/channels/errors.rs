//! Structured error events recorded on the errors channel.
//!
//! Runtime failures that do not abort the run (a failed tool call, a node
//! error in one branch, a timed-out node) are captured here as data so later
//! nodes and external observers can react to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::NodeKind;

/// Where in the runtime an error originated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    /// Inside a node's `run` or `stream` body.
    Node { kind: NodeKind, step: u64 },
    /// While executing a single tool call.
    Tool { call_id: String, tool: String },
    /// In the scheduler while dispatching or joining a frontier.
    Scheduler { step: u64 },
    /// In the runner's superstep loop.
    Runner { run_id: String, step: u64 },
    /// Anywhere else (setup, configuration, teardown).
    App,
}

/// The error payload itself: a human message plus optional cause chain and
/// machine-readable details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorDetail {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A single recorded failure: when it happened, where, what, and any tags or
/// context attached by the reporter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub when: DateTime<Utc>,
    #[serde(flatten)]
    pub scope: ErrorScope,
    pub error: ErrorDetail,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ErrorEvent {
    fn at(scope: ErrorScope, error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope,
            error,
            tags: Vec::new(),
            context: None,
        }
    }

    /// Error raised by a node during step `step`.
    #[must_use]
    pub fn node(kind: NodeKind, step: u64, error: ErrorDetail) -> Self {
        Self::at(ErrorScope::Node { kind, step }, error)
    }

    /// Failure of one tool call, identified by its call id.
    #[must_use]
    pub fn tool(
        call_id: impl Into<String>,
        tool: impl Into<String>,
        error: ErrorDetail,
    ) -> Self {
        Self::at(
            ErrorScope::Tool {
                call_id: call_id.into(),
                tool: tool.into(),
            },
            error,
        )
    }

    /// Error in the scheduler at step `step`.
    #[must_use]
    pub fn scheduler(step: u64, error: ErrorDetail) -> Self {
        Self::at(ErrorScope::Scheduler { step }, error)
    }

    /// Error in the runner loop for run `run_id`.
    #[must_use]
    pub fn runner(run_id: impl Into<String>, step: u64, error: ErrorDetail) -> Self {
        Self::at(
            ErrorScope::Runner {
                run_id: run_id.into(),
                step,
            },
            error,
        )
    }

    /// Error outside any run scope.
    #[must_use]
    pub fn app(error: ErrorDetail) -> Self {
        Self::at(ErrorScope::App, error)
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}
