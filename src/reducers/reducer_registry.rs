//! Registry mapping channels to their reducers.

use rustc_hash::FxHashMap;

use crate::node::NodePartial;
use crate::reducers::{AddErrors, AddMessages, MapMerge, Reducer};
use crate::state::VersionedState;
use crate::types::ChannelType;

/// Holds the reducer for each channel.
///
/// The default registry wires the three built-in channels. Registering a
/// reducer for a channel that already has one replaces it.
pub struct ReducerRegistry {
    reducers: FxHashMap<ChannelType, Box<dyn Reducer>>,
}

impl ReducerRegistry {
    /// An empty registry with no channels wired.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            reducers: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, channel: ChannelType, reducer: Box<dyn Reducer>) {
        self.reducers.insert(channel, reducer);
    }

    #[must_use]
    pub fn with_reducer(mut self, channel: ChannelType, reducer: Box<dyn Reducer>) -> Self {
        self.register(channel, reducer);
        self
    }

    /// Applies `update` through every registered reducer, in the fixed
    /// channel order messages, extra, errors. Returns the channels whose
    /// data changed.
    pub fn apply_all(
        &self,
        state: &mut VersionedState,
        update: &NodePartial,
    ) -> Vec<ChannelType> {
        let mut changed = Vec::new();
        for channel in [ChannelType::Message, ChannelType::Extra, ChannelType::Error] {
            if let Some(reducer) = self.reducers.get(&channel) {
                if reducer.apply(state, update) {
                    changed.push(channel);
                }
            }
        }
        changed
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::empty()
            .with_reducer(ChannelType::Message, Box::new(AddMessages))
            .with_reducer(ChannelType::Extra, Box::new(MapMerge))
            .with_reducer(ChannelType::Error, Box::new(AddErrors))
    }
}

impl std::fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.reducers.values().map(|r| r.name()).collect();
        f.debug_struct("ReducerRegistry").field("reducers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::utils::collections::extra_map_from;
    use serde_json::json;

    #[test]
    fn default_registry_covers_all_channels() {
        let registry = ReducerRegistry::default();
        let mut state = VersionedState::new_with_user_message("hi");
        let update = NodePartial::new()
            .with_messages(vec![Message::assistant("hello")])
            .with_extra(extra_map_from([("k", json!(1))]));
        let changed = registry.apply_all(&mut state, &update);
        assert_eq!(changed, vec![ChannelType::Message, ChannelType::Extra]);
    }

    #[test]
    fn empty_update_changes_nothing() {
        let registry = ReducerRegistry::default();
        let mut state = VersionedState::new_with_user_message("hi");
        assert!(registry.apply_all(&mut state, &NodePartial::new()).is_empty());
    }
}
