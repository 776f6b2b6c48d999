//! Node that executes the pending tool calls of the newest message.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::channels::errors::{ErrorDetail, ErrorEvent};
use crate::message::{Message, ToolCall};
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::tools::{ToolError, ToolRegistry};

/// Executes every pending tool call on the newest message, concurrently.
///
/// Guarantees, regardless of individual call failures:
/// - exactly one tool-result message per call, correlated by call id;
/// - result messages appear in the original call order;
/// - the run continues. A failed or unknown tool yields an error-shaped
///   result message plus an [`ErrorEvent`] on the errors channel.
///
/// A newest message with no pending calls produces an empty partial.
pub struct ToolsNode {
    registry: ToolRegistry,
}

impl ToolsNode {
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    async fn execute_call(&self, call: &ToolCall) -> Result<Value, ToolError> {
        match self.registry.get(&call.name) {
            Some(tool) => tool.call(call.args.clone()).await,
            None => Err(ToolError::Unknown(call.name.clone())),
        }
    }
}

#[async_trait]
impl Node for ToolsNode {
    #[instrument(skip_all, fields(node = %ctx.node, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let calls: Vec<ToolCall> = snapshot.pending_tool_calls().to_vec();
        if calls.is_empty() {
            debug!("no pending tool calls");
            return Ok(NodePartial::new());
        }

        for call in &calls {
            ctx.emit("tool_call", format!("{} ({})", call.name, call.id))?;
        }

        let results = join_all(calls.iter().map(|call| self.execute_call(call))).await;

        let mut messages = Vec::with_capacity(calls.len());
        let mut errors = Vec::new();
        for (call, result) in calls.iter().zip(results) {
            match result {
                Ok(value) => {
                    let content = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    messages.push(Message::tool(call.id.clone(), &content));
                }
                Err(err) => {
                    let failure = json!({
                        "error": err.to_string(),
                        "tool": call.name,
                        "call_id": call.id,
                    });
                    messages.push(Message::tool(call.id.clone(), &failure.to_string()));
                    errors.push(
                        ErrorEvent::tool(
                            call.id.clone(),
                            call.name.clone(),
                            ErrorDetail::new(err.to_string()).with_details(failure),
                        )
                        .with_tag("tool_call_failure"),
                    );
                }
            }
        }

        let mut partial = NodePartial::new().with_messages(messages);
        if !errors.is_empty() {
            partial = partial.with_errors(errors);
        }
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::NoopEmitter;
    use crate::runtime::RunConfig;
    use crate::state::VersionedState;
    use crate::tools::Tool;
    use crate::types::NodeKind;
    use std::sync::Arc;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        async fn call(&self, args: Value) -> Result<Value, ToolError> {
            let text = args["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArgs("text must be a string".into()))?;
            Ok(Value::String(text.to_uppercase()))
        }
    }

    fn ctx() -> NodeContext {
        NodeContext::new(
            NodeKind::Custom("tools".into()),
            1,
            RunConfig::new().with_run_id("run_test"),
            Arc::new(NoopEmitter),
        )
    }

    fn state_with_calls(calls: Vec<ToolCall>) -> VersionedState {
        VersionedState::builder()
            .with_user_message("hi")
            .with_message(Message::assistant("").with_tool_calls(calls))
            .build()
    }

    #[tokio::test]
    async fn each_call_yields_one_correlated_result() {
        let node = ToolsNode::new(ToolRegistry::new().with_tool(Upper));
        let state = state_with_calls(vec![
            ToolCall::new("c1", "upper", json!({"text": "a"})),
            ToolCall::new("c2", "upper", json!({"text": "b"})),
        ]);
        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(messages[0].content, "A");
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("c2"));
        assert_eq!(messages[1].content, "B");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_structured_failure() {
        let node = ToolsNode::new(ToolRegistry::new());
        let state = state_with_calls(vec![ToolCall::new("c1", "ghost", json!({}))]);
        let partial = node.run(state.snapshot(), ctx()).await.unwrap();

        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("c1"));
        assert!(messages[0].content.contains("ghost"));

        let errors = partial.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].tags.contains(&"tool_call_failure".to_string()));
    }

    #[tokio::test]
    async fn no_pending_calls_is_a_noop() {
        let node = ToolsNode::new(ToolRegistry::new().with_tool(Upper));
        let state = VersionedState::new_with_user_message("just chatting");
        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        assert!(partial.is_empty());
    }
}
