//! Shared nodes and models for integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::json;
use warpgraph::message::{Message, ToolCall};
use warpgraph::model::{ChatModel, ModelError};
use warpgraph::node::{
    FragmentStream, Node, NodeContext, NodeError, NodePartial, StreamingNode,
};
use warpgraph::runtime::RunConfig;
use warpgraph::state::StateSnapshot;
use warpgraph::tools::{Tool, ToolError};

/// Appends one assistant message with fixed content.
pub struct Appender(pub &'static str);

#[async_trait]
impl Node for Appender {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with_messages(vec![Message::assistant(self.0)]))
    }
}

/// Sleeps, then appends. Used for timeout and cancellation tests.
pub struct Slow {
    pub delay: Duration,
    pub text: &'static str,
}

#[async_trait]
impl Node for Slow {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        tokio::time::sleep(self.delay).await;
        Ok(NodePartial::new().with_messages(vec![Message::assistant(self.text)]))
    }
}

/// Streams cumulative prefixes of `full` under one fixed message id.
pub struct Chunky {
    pub id: &'static str,
    pub parts: Vec<&'static str>,
}

#[async_trait]
impl StreamingNode for Chunky {
    async fn stream(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<FragmentStream, NodeError> {
        let id = self.id;
        let parts = self.parts.clone();
        let fragments = async_stream::stream! {
            let mut acc = String::new();
            for part in parts {
                acc.push_str(part);
                yield Ok(NodePartial::new().with_messages(vec![Message::with_id(
                    id,
                    Message::ASSISTANT,
                    &acc,
                )]));
            }
        };
        Ok(fragments.boxed())
    }
}

/// Two-turn weather agent: first call requests the `search` tool, the call
/// after the tool result produces the final answer.
pub struct WeatherModel;

#[async_trait]
impl ChatModel for WeatherModel {
    async fn invoke(
        &self,
        messages: &[Message],
        _config: &RunConfig,
    ) -> Result<Message, ModelError> {
        let last = messages.last().ok_or_else(|| {
            ModelError::Provider("empty transcript".into())
        })?;
        if last.has_role(Message::TOOL) {
            Ok(Message::assistant(&format!(
                "The forecast says: {}",
                last.content
            )))
        } else {
            Ok(Message::assistant("").with_tool_calls(vec![ToolCall::new(
                "c1",
                "search",
                json!({"query": "weather in SF"}),
            )]))
        }
    }
}

/// Canned search tool answering every query with the same forecast.
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Ok(serde_json::Value::String(
            "Cloudy with a chance of hail.".to_string(),
        ))
    }
}

/// Convenience: Arc a model for node construction.
pub fn weather_model() -> Arc<dyn ChatModel> {
    Arc::new(WeatherModel)
}
