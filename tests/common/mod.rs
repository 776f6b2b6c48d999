pub mod nodes;

use warpgraph::event_bus::{Event, EventStream};

/// Drains `events` until the run-end diagnostic, inclusive.
pub async fn drain(events: &mut EventStream) -> Vec<Event> {
    events.collect_until_run_end().await
}
