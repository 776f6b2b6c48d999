//! Channel reducers: the only code that writes run state.
//!
//! Each channel has exactly one reducer. The barrier hands a reducer the
//! aggregated [`NodePartial`] for a superstep and the reducer folds the
//! relevant field into its channel, reporting whether the data changed so the
//! barrier can decide about version bumps.

use crate::node::NodePartial;
use crate::state::VersionedState;

pub mod add_errors;
pub mod add_messages;
pub mod map_merge;
pub mod reducer_registry;

pub use add_errors::AddErrors;
pub use add_messages::AddMessages;
pub use map_merge::MapMerge;
pub use reducer_registry::ReducerRegistry;

/// Applies one channel's slice of a partial update to run state.
pub trait Reducer: Send + Sync {
    /// Stable name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Folds `update`'s slice for this reducer's channel into `state`.
    /// Returns true when the channel data actually changed.
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> bool;
}
