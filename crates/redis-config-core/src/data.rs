//! Case-insensitive configuration snapshot.
//!
//! A [`ConfigData`] is the immutable result of reading the backing hash
//! once: a flat string map whose lookups ignore key casing. Keys are folded
//! to lowercase for storage and lookup, while the original casing of the
//! last write is kept for enumeration. When two hash fields collide under
//! the fold, the field read later wins.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// Key exactly as it was read from the store.
    key: String,
    value: String,
}

/// Flat key-value snapshot of one configuration hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    entries: HashMap<String, Entry>,
}

impl ConfigData {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from hash fields in read order.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut data = Self::new();
        for (key, value) in fields {
            data.insert(key, value);
        }
        data
    }

    fn insert(&mut self, key: String, value: String) {
        self.entries.insert(key.to_lowercase(), Entry { key, value });
    }

    /// Look up a value, ignoring the casing of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|entry| entry.value.as_str())
    }

    /// Whether a value exists under `key`, ignoring casing.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Number of distinct keys after case folding.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs with original key casing, in no
    /// particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    /// Iterate keys with their original casing, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_lookup_ignores_key_casing() {
        let data = ConfigData::from_fields(fields(&[("Logging:Level", "debug")]));

        assert_eq!(data.get("Logging:Level"), Some("debug"));
        assert_eq!(data.get("logging:level"), Some("debug"));
        assert_eq!(data.get("LOGGING:LEVEL"), Some("debug"));
        assert!(data.contains_key("logging:LEVEL"));
    }

    #[test]
    fn test_missing_key_reads_as_none() {
        let data = ConfigData::from_fields(fields(&[("a", "1")]));
        assert_eq!(data.get("b"), None);
        assert!(!data.contains_key("b"));
    }

    #[test]
    fn test_later_field_wins_on_case_collision() {
        let data = ConfigData::from_fields(fields(&[("Key", "first"), ("KEY", "second")]));

        assert_eq!(data.len(), 1);
        assert_eq!(data.get("key"), Some("second"));
    }

    #[test]
    fn test_enumeration_preserves_casing_of_last_write() {
        let data = ConfigData::from_fields(fields(&[("Alpha", "1"), ("ALPHA", "2"), ("Beta", "3")]));

        let mut keys: Vec<&str> = data.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["ALPHA", "Beta"]);
    }

    #[test]
    fn test_empty_fields_yield_empty_snapshot() {
        let data = ConfigData::from_fields(Vec::new());
        assert!(data.is_empty());
        assert_eq!(data.len(), 0);
    }

    #[test]
    fn test_empty_values_are_kept() {
        let data = ConfigData::from_fields(fields(&[("feature:flag", "")]));
        assert_eq!(data.get("Feature:Flag"), Some(""));
    }

    #[test]
    fn test_iter_pairs_match_inserted_values() {
        let data = ConfigData::from_fields(fields(&[("One", "1"), ("Two", "2")]));

        let mut pairs: Vec<(&str, &str)> = data.iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![("One", "1"), ("Two", "2")]);
    }

    proptest! {
        #[test]
        fn test_lookup_agrees_across_casings(
            pairs in prop::collection::vec(("[a-zA-Z][a-zA-Z0-9_:]{0,8}", "[ -~]{0,12}"), 0..16)
        ) {
            let data = ConfigData::from_fields(pairs.clone());
            for (key, _) in &pairs {
                prop_assert_eq!(data.get(key), data.get(&key.to_uppercase()));
                prop_assert_eq!(data.get(key), data.get(&key.to_lowercase()));
            }
        }

        #[test]
        fn test_folding_matches_reference_map(
            pairs in prop::collection::vec(("[a-zA-Z][a-zA-Z0-9_:]{0,8}", "[ -~]{0,12}"), 0..16)
        ) {
            let data = ConfigData::from_fields(pairs.clone());

            let mut expected: HashMap<String, String> = HashMap::new();
            for (key, value) in &pairs {
                expected.insert(key.to_lowercase(), value.clone());
            }

            prop_assert_eq!(data.len(), expected.len());
            for (folded, value) in &expected {
                prop_assert_eq!(data.get(folded), Some(value.as_str()));
            }
        }
    }
}
