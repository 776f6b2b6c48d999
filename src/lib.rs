//! # Warpgraph: Stateful Graph Execution for Conversational Agents
//!
//! Warpgraph runs directed graphs of async nodes over shared, versioned
//! state. Frontiers execute concurrently, a deterministic barrier merges
//! each node's partial update through per-channel reducers, and routing
//! picks the next frontier from the committed state. The same engine drives
//! one-shot invocation and live event streaming.
//!
//! ## Core Concepts
//!
//! - **Channels**: Named slices of state, each with a reducer and a version.
//!   Messages merge append-with-upsert by id, extras merge per key with the
//!   incoming value winning, errors append.
//! - **Nodes**: Async units of work reading a snapshot and returning a
//!   [`node::NodePartial`]. Streaming nodes yield fragments that surface on
//!   the event stream before they fold into one partial.
//! - **Supersteps**: Schedule the frontier, wait for every node, commit all
//!   partials at one barrier, route. A step fuse bounds cyclic graphs.
//! - **Events**: Every run emits ordered [`event_bus::Event`]s; subscribers
//!   pick a [`event_bus::StreamMode`] to see the final values, per-node
//!   updates, or everything.
//!
//! ## Quick Start
//!
//! ```
//! use warpgraph::{
//!     graphs::GraphBuilder,
//!     message::Message,
//!     node::{Node, NodeContext, NodeError, NodePartial},
//!     state::{StateSnapshot, VersionedState},
//!     types::NodeKind,
//! };
//! use async_trait::async_trait;
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl Node for Greeter {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<NodePartial, NodeError> {
//!         Ok(NodePartial::new().with_messages(vec![Message::assistant("Hello!")]))
//!     }
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = GraphBuilder::new()
//!     .add_node("greeter", Greeter)
//!     .add_edge("greeter", NodeKind::End)
//!     .set_entry("greeter")
//!     .compile()?;
//!
//! let final_state = graph
//!     .invoke(VersionedState::new_with_user_message("Hi"))
//!     .await?;
//! assert_eq!(final_state.messages.snapshot().last().unwrap().content, "Hello!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming a Run
//!
//! [`app::CompiledGraph::stream`] starts the run on a background task and
//! hands back a [`runtime::RunHandle`] (cancel, inspect committed state)
//! plus an [`event_bus::EventStream`] filtered by the chosen mode:
//!
//! ```no_run
//! # use warpgraph::{app::CompiledGraph, event_bus::StreamMode, state::VersionedState};
//! # async fn demo(graph: CompiledGraph) {
//! let (handle, mut events) = graph.stream(
//!     VersionedState::new_with_user_message("what's the weather in SF?"),
//!     StreamMode::Events,
//! );
//! while let Some(event) = events.recv().await {
//!     println!("{event}");
//! }
//! let final_state = handle.join().await.unwrap();
//! # let _ = final_state;
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`message`] - Messages, roles, and tool-call payloads
//! - [`state`] - Versioned state and snapshots
//! - [`channels`] - Channel storage and versioning
//! - [`reducers`] - Per-channel merge strategies
//! - [`node`] - Node traits, partial updates, execution context
//! - [`graphs`] - Graph definition and compile-time validation
//! - [`app`] - The compiled graph: barrier, invoke, stream
//! - [`runtime`] - Run configuration, scheduler, superstep runner, handles
//! - [`event_bus`] - Events, the broadcast hub, sinks
//! - [`tools`] - Tool boundary, registry, and the tool-execution node
//! - [`model`] - Chat model boundary and its node adapters

pub mod app;
pub mod channels;
pub mod event_bus;
pub mod graphs;
pub mod message;
pub mod model;
pub mod node;
pub mod reducers;
pub mod runtime;
pub mod state;
pub mod telemetry;
pub mod tools;
pub mod types;
pub mod utils;
