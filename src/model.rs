//! Chat model boundary and the nodes that adapt it to the graph.
//!
//! The engine never talks to a provider directly. Implement [`ChatModel`]
//! for your provider and hang it on a [`ModelNode`] (one-shot) or a
//! [`StreamingModelNode`] (token streaming) when building the graph.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use miette::Diagnostic;
use thiserror::Error;

use crate::message::{Message, ToolCall};
use crate::runtime::RunConfig;
use crate::node::{
    FragmentStream, Node, NodeContext, NodeError, NodePartial, StreamingNode,
};
use crate::state::StateSnapshot;
use crate::utils::id_generator::IdGenerator;

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("model provider failed: {0}")]
    #[diagnostic(code(warpgraph::model::provider))]
    Provider(String),

    #[error("model stream failed: {0}")]
    #[diagnostic(code(warpgraph::model::stream))]
    Stream(String),
}

/// One increment of a streamed model response.
#[derive(Clone, Debug, Default)]
pub struct MessageChunk {
    /// New content since the previous chunk.
    pub content_delta: String,
    /// Tool calls introduced by this chunk.
    pub tool_calls: Vec<ToolCall>,
    /// Set on the last chunk of the response.
    pub is_final: bool,
}

pub type ChunkStream = BoxStream<'static, Result<MessageChunk, ModelError>>;

/// A conversational model.
///
/// Both operations receive the [`RunConfig`] of the invoking run, so
/// providers can honor per-run metadata without reaching for ambient state.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produces one complete assistant turn for the transcript.
    async fn invoke(
        &self,
        messages: &[Message],
        config: &RunConfig,
    ) -> Result<Message, ModelError>;

    /// Produces the turn as a chunk stream. The default wraps
    /// [`invoke`](Self::invoke) in a single final chunk, so providers
    /// without native streaming still work behind a streaming node.
    async fn stream(
        &self,
        messages: &[Message],
        config: &RunConfig,
    ) -> Result<ChunkStream, ModelError> {
        let message = self.invoke(messages, config).await?;
        let chunk = MessageChunk {
            content_delta: message.content,
            tool_calls: message.tool_calls,
            is_final: true,
        };
        Ok(futures_util::stream::once(async move { Ok(chunk) }).boxed())
    }
}

/// Direct node producing one assistant message per invocation.
pub struct ModelNode {
    model: Arc<dyn ChatModel>,
}

impl ModelNode {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node for ModelNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let message = self
            .model
            .invoke(&snapshot.messages, &ctx.config)
            .await
            .map_err(|err| NodeError::Provider {
                provider: "chat_model".into(),
                message: err.to_string(),
            })?;
        Ok(NodePartial::new().with_messages(vec![message]))
    }
}

/// Streaming node surfacing the model's response incrementally.
///
/// Every fragment carries the same message id with the content accumulated
/// so far, so the append-with-upsert reducer converges the transcript onto
/// one assistant message no matter how many fragments were observed.
pub struct StreamingModelNode {
    model: Arc<dyn ChatModel>,
}

impl StreamingModelNode {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl StreamingNode for StreamingModelNode {
    async fn stream(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<FragmentStream, NodeError> {
        let chunks = self
            .model
            .stream(&snapshot.messages, &ctx.config)
            .await
            .map_err(|err| NodeError::Provider {
                provider: "chat_model".into(),
                message: err.to_string(),
            })?;

        let id = IdGenerator::new().generate_message_id();
        let fragments = chunks.scan(
            (id, String::new(), Vec::<ToolCall>::new()),
            |(id, content, tool_calls), chunk| {
                let item = match chunk {
                    Ok(chunk) => {
                        content.push_str(&chunk.content_delta);
                        tool_calls.extend(chunk.tool_calls);
                        let message = Message::with_id(id.clone(), Message::ASSISTANT, content)
                            .with_tool_calls(tool_calls.clone());
                        Ok(NodePartial::new().with_messages(vec![message]))
                    }
                    Err(err) => Err(NodeError::Provider {
                        provider: "chat_model".into(),
                        message: err.to_string(),
                    }),
                };
                futures_util::future::ready(Some(item))
            },
        );
        Ok(fragments.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::NoopEmitter;
    use crate::state::VersionedState;
    use crate::types::NodeKind;

    struct Scripted(Vec<&'static str>);

    #[async_trait]
    impl ChatModel for Scripted {
        async fn invoke(
            &self,
            _messages: &[Message],
            _config: &RunConfig,
        ) -> Result<Message, ModelError> {
            Ok(Message::assistant(&self.0.join("")))
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _config: &RunConfig,
        ) -> Result<ChunkStream, ModelError> {
            let parts = self.0.clone();
            let last = parts.len().saturating_sub(1);
            let chunks = parts.into_iter().enumerate().map(move |(i, part)| {
                Ok(MessageChunk {
                    content_delta: part.to_string(),
                    tool_calls: vec![],
                    is_final: i == last,
                })
            });
            Ok(futures_util::stream::iter(chunks).boxed())
        }
    }

    fn ctx() -> NodeContext {
        NodeContext::new(
            NodeKind::Custom("agent".into()),
            1,
            RunConfig::new().with_run_id("run_test"),
            Arc::new(NoopEmitter),
        )
    }

    #[tokio::test]
    async fn streaming_fragments_are_cumulative_under_one_id() {
        let node = StreamingModelNode::new(Arc::new(Scripted(vec!["Clo", "udy", "."])));
        let state = VersionedState::new_with_user_message("weather?");
        let mut fragments = node.stream(state.snapshot(), ctx()).await.unwrap();

        let mut seen = Vec::new();
        while let Some(fragment) = fragments.next().await {
            let messages = fragment.unwrap().messages.unwrap();
            assert_eq!(messages.len(), 1);
            seen.push((messages[0].id.clone(), messages[0].content.clone()));
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].1, "Cloudy.");
        assert!(seen.iter().all(|(id, _)| id == &seen[0].0));
    }

    #[tokio::test]
    async fn model_node_appends_one_assistant_message() {
        let node = ModelNode::new(Arc::new(Scripted(vec!["hello"])));
        let state = VersionedState::new_with_user_message("hi");
        let partial = node.run(state.snapshot(), ctx()).await.unwrap();
        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }
}
