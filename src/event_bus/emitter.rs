//! Emitter trait decoupling producers from the bus implementation.

use miette::Diagnostic;
use thiserror::Error;

use crate::event_bus::Event;

#[derive(Debug, Error, Diagnostic)]
pub enum EmitterError {
    /// The bus listener has shut down; no event can be delivered.
    #[error("event bus channel closed")]
    #[diagnostic(code(warpgraph::event_bus::closed))]
    Closed,
}

/// Anything that can accept events from nodes, the scheduler, and the runner.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: Event) -> Result<(), EmitterError>;
}

/// Emitter that drops everything. Used when no observer is attached and in
/// unit tests that do not care about events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: Event) -> Result<(), EmitterError> {
        Ok(())
    }
}
