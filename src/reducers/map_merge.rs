//! Last-writer-wins reducer for the extras channel.

use crate::channels::Channel;
use crate::node::NodePartial;
use crate::reducers::Reducer;
use crate::state::VersionedState;

/// Merges incoming key/value pairs into the extras map, overwriting any
/// existing value per key.
#[derive(Debug, Default)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn name(&self) -> &'static str {
        "map_merge"
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> bool {
        let Some(incoming) = &update.extra else {
            return false;
        };
        let map = state.extra.get_mut();
        let mut changed = false;
        for (key, value) in incoming {
            if map.get(key) != Some(value) {
                map.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::collections::extra_map_from;
    use serde_json::json;

    #[test]
    fn later_values_overwrite_earlier() {
        let mut state = VersionedState::new_with_user_message("hi");
        state.add_extra("k", json!(1));
        let update = NodePartial::new().with_extra(extra_map_from([("k", json!(2))]));
        assert!(MapMerge.apply(&mut state, &update));
        assert_eq!(state.extra.get()["k"], json!(2));
    }

    #[test]
    fn rewriting_same_value_is_not_a_change() {
        let mut state = VersionedState::new_with_user_message("hi");
        state.add_extra("k", json!(1));
        let update = NodePartial::new().with_extra(extra_map_from([("k", json!(1))]));
        assert!(!MapMerge.apply(&mut state, &update));
    }
}
