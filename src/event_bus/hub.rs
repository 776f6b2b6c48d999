//! Broadcast hub fanning events out to any number of subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::Stream;
use tokio::sync::broadcast;

use crate::event_bus::{EmitterError, Event, EventEmitter, StreamMode};

/// Default broadcast buffer size per subscriber.
pub const DEFAULT_HUB_CAPACITY: usize = 1024;

/// Fan-out point for run events, backed by a tokio broadcast channel.
///
/// Subscribers that fall behind lose the oldest events; the loss is counted
/// on their [`EventStream`] rather than silently swallowed.
#[derive(Clone, Debug)]
pub struct EventHub {
    sender: broadcast::Sender<Event>,
}

impl EventHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers. An event with no
    /// subscribers is simply dropped.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    /// Opens a new subscription filtered by `mode`.
    #[must_use]
    pub fn subscribe(&self, mode: StreamMode) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            mode,
            lagged: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A cloneable emitter publishing straight into this hub.
    #[must_use]
    pub fn emitter(&self) -> HubEmitter {
        HubEmitter {
            sender: self.sender.clone(),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

/// Emitter handle writing into an [`EventHub`].
#[derive(Clone, Debug)]
pub struct HubEmitter {
    sender: broadcast::Sender<Event>,
}

impl EventEmitter for HubEmitter {
    fn emit(&self, event: Event) -> Result<(), EmitterError> {
        // No subscribers is not a failure; the run must not depend on being
        // observed.
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// A filtered subscription to run events.
pub struct EventStream {
    receiver: broadcast::Receiver<Event>,
    mode: StreamMode,
    lagged: Arc<AtomicU64>,
}

impl EventStream {
    /// Waits for the next event admitted by this stream's mode.
    ///
    /// Returns `None` once the hub is closed and all buffered events are
    /// drained. Lag gaps are recorded and skipped.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.mode.admits(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.lagged.fetch_add(n, Ordering::Relaxed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.mode.admits(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    self.lagged.fetch_add(n, Ordering::Relaxed);
                }
                Err(_) => return None,
            }
        }
    }

    /// Like [`recv`](Self::recv) with an upper bound on the wait. Returns
    /// `None` on timeout as well as on close.
    pub async fn next_timeout(&mut self, timeout: Duration) -> Option<Event> {
        tokio::time::timeout(timeout, self.recv()).await.ok().flatten()
    }

    /// Number of events this subscriber missed by falling behind.
    #[must_use]
    pub fn lag_count(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }

    /// Drains every admitted event until the run-end diagnostic, inclusive.
    pub async fn collect_until_run_end(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            let done = event.is_run_end();
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    /// Adapts this subscription into a [`Stream`] of events.
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send {
        futures_util::stream::unfold(self, |mut stream| async move {
            stream.recv().await.map(|event| (event, stream))
        })
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("mode", &self.mode)
            .field("lagged", &self.lag_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::RUN_END_SCOPE;
    use crate::types::NodeKind;

    #[tokio::test]
    async fn subscribers_see_events_in_publish_order() {
        let hub = EventHub::new(8);
        let mut stream = hub.subscribe(StreamMode::Events);
        hub.publish(Event::node_lifecycle(NodeKind::Custom("a".into()), 1, "start"));
        hub.publish(Event::node_lifecycle(NodeKind::Custom("a".into()), 1, "done"));
        assert_eq!(stream.recv().await.unwrap().message(), "start");
        assert_eq!(stream.recv().await.unwrap().message(), "done");
    }

    #[tokio::test]
    async fn values_mode_skips_other_events() {
        let hub = EventHub::new(8);
        let mut stream = hub.subscribe(StreamMode::Values);
        hub.publish(Event::node_lifecycle(NodeKind::Custom("a".into()), 1, "start"));
        hub.publish(Event::diagnostic(RUN_END_SCOPE, "completed"));
        let event = stream.recv().await.unwrap();
        assert!(event.is_run_end());
    }

    #[tokio::test]
    async fn next_timeout_returns_none_when_idle() {
        let hub = EventHub::new(8);
        let mut stream = hub.subscribe(StreamMode::Events);
        assert!(stream.next_timeout(Duration::from_millis(10)).await.is_none());
    }
}
