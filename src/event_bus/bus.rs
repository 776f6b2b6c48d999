//! The event bus: ingestion channel, listener task, hub, and sinks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::event_bus::{
    EmitterError, Event, EventEmitter, EventHub, EventSink, EventStream, StreamMode,
    DEFAULT_HUB_CAPACITY,
};

/// Central event pipeline for a run.
///
/// Producers emit through a cloneable [`BusEmitter`] into a flume channel. A
/// listener task drains the channel, hands each event to every attached sink,
/// then publishes it to the broadcast hub for subscribers. A single ingestion
/// point keeps the global event order consistent for sinks and subscribers
/// alike.
pub struct EventBus {
    tx: flume::Sender<Event>,
    hub: EventHub,
    listener: JoinHandle<()>,
}

impl EventBus {
    /// Creates a bus with the default hub capacity and no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    /// Creates a bus forwarding every event to `sinks` before broadcast.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>) -> Self {
        let (tx, rx) = flume::unbounded::<Event>();
        let hub = EventHub::new(DEFAULT_HUB_CAPACITY);
        let fanout = hub.clone();
        let listener = tokio::spawn(async move {
            while let Ok(event) = rx.recv_async().await {
                for sink in &sinks {
                    sink.on_event(&event);
                }
                fanout.publish(event);
            }
            debug!("event bus listener stopped");
        });
        Self { tx, hub, listener }
    }

    /// A cloneable emitter feeding this bus.
    #[must_use]
    pub fn emitter(&self) -> Arc<dyn EventEmitter> {
        Arc::new(BusEmitter {
            tx: self.tx.clone(),
        })
    }

    /// Opens a subscription on the hub side, filtered by `mode`.
    #[must_use]
    pub fn subscribe(&self, mode: StreamMode) -> EventStream {
        self.hub.subscribe(mode)
    }

    /// Closes ingestion and waits for the listener to drain.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.listener.await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

/// Emitter handle writing into the bus ingestion channel.
#[derive(Clone)]
struct BusEmitter {
    tx: flume::Sender<Event>,
}

impl EventEmitter for BusEmitter {
    fn emit(&self, event: Event) -> Result<(), EmitterError> {
        self.tx.send(event).map_err(|_| EmitterError::Closed)
    }
}
