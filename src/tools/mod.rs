//! Tool execution: the [`Tool`] boundary, a registry, and the node that
//! resolves an assistant turn's pending calls.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

pub mod registry;
pub mod tool_node;

pub use registry::ToolRegistry;
pub use tool_node::ToolsNode;

/// Failure of a single tool call. Never aborts a run; the failure becomes a
/// structured result correlated to the call id.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    #[error("no tool registered under `{0}`")]
    #[diagnostic(code(warpgraph::tools::unknown))]
    Unknown(String),

    #[error("invalid arguments: {0}")]
    #[diagnostic(code(warpgraph::tools::invalid_args))]
    InvalidArgs(String),

    #[error("tool execution failed: {0}")]
    #[diagnostic(code(warpgraph::tools::execution))]
    Execution(String),
}

/// An invokable tool.
///
/// Implementations receive the call's JSON arguments and return a JSON
/// result. String results pass through verbatim as tool-message content;
/// any other value is serialized.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to request this tool.
    fn name(&self) -> &str;

    /// Short description for prompt construction.
    fn description(&self) -> &str {
        ""
    }

    /// JSON schema describing the expected arguments. `Null` means the
    /// tool does not publish one.
    fn schema(&self) -> Value {
        Value::Null
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}
