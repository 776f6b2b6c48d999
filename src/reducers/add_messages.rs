//! Append-with-upsert reducer for the messages channel.

use crate::channels::Channel;
use crate::message::Message;
use crate::node::NodePartial;
use crate::reducers::Reducer;
use crate::state::VersionedState;

/// Upserts `incoming` into `base` by message id.
///
/// A message whose id already exists replaces the existing entry in place,
/// keeping its position in the transcript. Unknown ids append in order.
/// Returns true when anything changed.
pub fn upsert_messages(base: &mut Vec<Message>, incoming: Vec<Message>) -> bool {
    let mut changed = false;
    for message in incoming {
        match base.iter().position(|m| m.id == message.id) {
            Some(pos) => {
                if base[pos] != message {
                    base[pos] = message;
                    changed = true;
                }
            }
            None => {
                base.push(message);
                changed = true;
            }
        }
    }
    changed
}

/// Reducer wiring [`upsert_messages`] to the messages channel.
#[derive(Debug, Default)]
pub struct AddMessages;

impl Reducer for AddMessages {
    fn name(&self) -> &'static str {
        "add_messages"
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> bool {
        match &update.messages {
            Some(incoming) => upsert_messages(state.messages.get_mut(), incoming.clone()),
            None => false,
        }
    }
}
