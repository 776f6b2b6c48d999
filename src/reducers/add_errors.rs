//! Append-only reducer for the errors channel.

use crate::channels::Channel;
use crate::node::NodePartial;
use crate::reducers::Reducer;
use crate::state::VersionedState;

/// Appends incoming error events. Nothing is ever deduplicated or removed;
/// the errors channel is the run's failure log.
#[derive(Debug, Default)]
pub struct AddErrors;

impl Reducer for AddErrors {
    fn name(&self) -> &'static str {
        "add_errors"
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> bool {
        match &update.errors {
            Some(incoming) if !incoming.is_empty() => {
                state.errors.get_mut().extend(incoming.iter().cloned());
                true
            }
            _ => false,
        }
    }
}
