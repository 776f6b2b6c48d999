//! Id generation for runs and messages.

use uuid::Uuid;

/// Generates unique ids for runs, messages, and tool calls.
///
/// Thin wrapper over UUID v4 so tests can assert on prefixes rather than
/// scattering `Uuid::new_v4()` through the crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// New id for a run, e.g. `run_5b2c...`.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run_{}", Uuid::new_v4().simple())
    }

    /// New id for a message, e.g. `msg_5b2c...`.
    #[must_use]
    pub fn generate_message_id(&self) -> String {
        format!("msg_{}", Uuid::new_v4().simple())
    }

    /// New id for a tool call, e.g. `call_5b2c...`.
    #[must_use]
    pub fn generate_call_id(&self) -> String {
        format!("call_{}", Uuid::new_v4().simple())
    }
}
