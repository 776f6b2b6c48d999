//! Small collection helpers shared across the crate.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Creates an empty extras map with the hasher used throughout the crate.
#[must_use]
pub fn new_extra_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

/// Creates an extras map pre-populated from an iterator of pairs.
#[must_use]
pub fn extra_map_from<I, K>(pairs: I) -> FxHashMap<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_map_from_collects_pairs() {
        let map = extra_map_from([("a", json!(1)), ("b", json!("two"))]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], json!(1));
    }
}
