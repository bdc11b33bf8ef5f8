use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use gavagai_api::{InsightsPayload, InsightsResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Lookup key for previously fetched insights.
pub struct CacheKey(String);

impl CacheKey {
    /// Base64 of `projectId:topic:sentiment`.
    pub fn derive(payload: &InsightsPayload) -> Self {
        let joined = format!(
            "{}:{}:{}",
            payload.project_id, payload.topic, payload.sentiment
        );
        Self(BASE64_STANDARD.encode(joined.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-value store for fetched insights, injected into the panel.
pub trait InsightsStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<InsightsResult>;
    fn put(&self, key: CacheKey, value: InsightsResult);
}

#[derive(Debug, Default)]
/// Process-lifetime store. Entries are never evicted or expired.
pub struct MemoryInsightsStore {
    entries: RwLock<HashMap<CacheKey, InsightsResult>>,
}

impl MemoryInsightsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InsightsStore for MemoryInsightsStore {
    fn get(&self, key: &CacheKey) -> Option<InsightsResult> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn put(&self, key: CacheKey, value: InsightsResult) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, value);
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that never holds anything; every lookup misses.
pub struct DisabledInsightsStore;

impl InsightsStore for DisabledInsightsStore {
    fn get(&self, _key: &CacheKey) -> Option<InsightsResult> {
        None
    }

    fn put(&self, _key: CacheKey, _value: InsightsResult) {}
}

#[cfg(test)]
mod tests {
    use super::{CacheKey, DisabledInsightsStore, InsightsStore, MemoryInsightsStore};
    use gavagai_api::InsightsPayload;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn unit_cache_key_matches_base64_of_joined_fields() {
        let key = CacheKey::derive(&InsightsPayload::new("p1", "t1", "pos"));
        // base64("p1:t1:pos")
        assert_eq!(key.as_str(), "cDE6dDE6cG9z");
    }

    #[test]
    fn functional_cache_key_is_deterministic_and_distinct_per_tuple() {
        let payload = InsightsPayload::new("p1", "t1", "pos");
        assert_eq!(CacheKey::derive(&payload), CacheKey::derive(&payload.clone()));

        let mut seen = HashSet::new();
        for project in ["p1", "p2", "project-3"] {
            for topic in ["t1", "t2", "delivery times"] {
                for sentiment in ["pos", "neg", "neutral"] {
                    let key = CacheKey::derive(&InsightsPayload::new(project, topic, sentiment));
                    assert!(seen.insert(key), "collision for {project}/{topic}/{sentiment}");
                }
            }
        }
        assert_eq!(seen.len(), 27);
    }

    #[test]
    fn unit_cache_key_ignores_texts() {
        let mut with_texts = InsightsPayload::new("p1", "t1", "pos");
        with_texts.texts = Some(vec!["hello".to_string()]);
        assert_eq!(
            CacheKey::derive(&with_texts),
            CacheKey::derive(&InsightsPayload::new("p1", "t1", "pos"))
        );
    }

    #[test]
    fn unit_memory_store_round_trips_and_overwrites() {
        let store = MemoryInsightsStore::new();
        let key = CacheKey::derive(&InsightsPayload::new("p1", "t1", "pos"));
        assert!(store.is_empty());
        assert_eq!(store.get(&key), None);

        store.put(key.clone(), json!({"score": 0.5}));
        store.put(key.clone(), json!({"score": 0.8}));
        assert_eq!(store.get(&key), Some(json!({"score": 0.8})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unit_disabled_store_always_misses() {
        let store = DisabledInsightsStore;
        let key = CacheKey::derive(&InsightsPayload::new("p1", "t1", "pos"));
        store.put(key.clone(), json!({"score": 0.5}));
        assert_eq!(store.get(&key), None);
    }

    proptest! {
        #[test]
        fn property_cache_keys_differ_for_distinct_colon_free_tuples(
            left in ("[a-z0-9]{1,8}", "[a-z0-9 ]{0,12}", "[a-z]{0,8}"),
            right in ("[a-z0-9]{1,8}", "[a-z0-9 ]{0,12}", "[a-z]{0,8}"),
        ) {
            let left_key = CacheKey::derive(&InsightsPayload::new(&left.0, &left.1, &left.2));
            let right_key = CacheKey::derive(&InsightsPayload::new(&right.0, &right.1, &right.2));
            prop_assert_eq!(left == right, left_key == right_key);
        }
    }
}
