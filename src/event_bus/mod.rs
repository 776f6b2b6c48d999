//! Run observability: events, emitters, the broadcast hub, sinks, and the
//! bus that ties them together.
//!
//! Layering, producer to consumer:
//! 1. Nodes, the scheduler, and the runner emit through [`EventEmitter`].
//! 2. [`EventBus`] serializes everything onto one listener task.
//! 3. Sinks ([`EventSink`]) get each event first, then [`EventHub`]
//!    broadcasts it to [`EventStream`] subscribers.

pub mod bus;
pub mod emitter;
pub mod event;
pub mod hub;
pub mod sink;

pub use bus::EventBus;
pub use emitter::{EmitterError, EventEmitter, NoopEmitter};
pub use event::{
    DiagnosticEvent, Event, NodeEvent, StateUpdateEvent, StreamFragmentEvent, StreamMode,
    ValuesEvent, RUN_END_SCOPE,
};
pub use hub::{EventHub, EventStream, HubEmitter, DEFAULT_HUB_CAPACITY};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
