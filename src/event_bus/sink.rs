//! Event sinks: terminal consumers attached to the bus.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::event_bus::Event;

/// A terminal consumer of events. Sinks run on the bus listener task and
/// must not block.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Writes each event's [`Display`](std::fmt::Display) line to stdout.
#[derive(Debug, Default)]
pub struct StdOutSink;

impl EventSink for StdOutSink {
    fn on_event(&self, event: &Event) {
        println!("{event}");
    }
}

/// Collects events in memory for later inspection. Cloning shares the
/// underlying buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything captured so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards events into a flume channel, bridging the bus to external
/// consumers. Delivery stops silently once the receiver is dropped.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: flume::Sender<Event>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: flume::Sender<Event>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    #[test]
    fn memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.on_event(&Event::node_lifecycle(NodeKind::Custom("a".into()), 1, "start"));
        sink.on_event(&Event::node_lifecycle(NodeKind::Custom("a".into()), 1, "done"));
        let events = sink.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message(), "start");
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = flume::unbounded();
        let sink = ChannelSink::new(tx);
        sink.on_event(&Event::diagnostic("test", "hello"));
        assert_eq!(rx.recv().unwrap().message(), "hello");
    }
}
