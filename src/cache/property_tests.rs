//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's invariants over arbitrary operation
//! sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStore};

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,8}(:[a-z0-9]{0,6})?"
}

#[derive(Debug, Clone)]
enum StoreOp {
    Put { key: String, value: u32, advance: u64 },
    Lookup { key: String, ttl_ms: u64, advance: u64 },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), any::<u32>(), 0u64..10_000)
            .prop_map(|(key, value, advance)| StoreOp::Put { key, value, advance }),
        (key_strategy(), 0u64..20_000, 0u64..10_000)
            .prop_map(|(key, ttl_ms, advance)| StoreOp::Lookup { key, ttl_ms, advance }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // At most one entry per key: the store always matches a plain map model
    // where every put overwrites.
    #[test]
    fn prop_store_matches_overwrite_model(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = CacheStore::new();
        let mut model: HashMap<String, (u32, u64)> = HashMap::new();
        let mut now = 0u64;

        for op in ops {
            match op {
                StoreOp::Put { key, value, advance } => {
                    now += advance;
                    store.put(key.clone(), value, now);
                    model.insert(key, (value, now));
                }
                StoreOp::Lookup { key, ttl_ms, advance } => {
                    now += advance;
                    let ttl = Duration::from_millis(ttl_ms);
                    let expected = model
                        .get(&key)
                        .filter(|(_, stored_at)| now - stored_at < ttl_ms)
                        .map(|(value, _)| *value);
                    prop_assert_eq!(store.lookup_fresh(&key, ttl, now), expected);
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
        for (key, (value, stored_at)) in &model {
            let entry = store.get(key).unwrap();
            prop_assert_eq!(entry.value, *value);
            prop_assert_eq!(entry.stored_at, *stored_at);
        }
    }

    // Hits plus misses always equals the number of fresh-lookups performed.
    #[test]
    fn prop_lookup_counters_accurate(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = CacheStore::new();
        let mut lookups = 0u64;
        let mut hits = 0u64;
        let mut now = 0u64;

        for op in ops {
            match op {
                StoreOp::Put { key, value, advance } => {
                    now += advance;
                    store.put(key, value, now);
                }
                StoreOp::Lookup { key, ttl_ms, advance } => {
                    now += advance;
                    lookups += 1;
                    if store.lookup_fresh(&key, Duration::from_millis(ttl_ms), now).is_some() {
                        hits += 1;
                    }
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.hits + stats.misses, lookups);
        prop_assert_eq!(stats.total_entries, store.len());
    }

    // A bounded store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(
        keys in prop::collection::vec(key_strategy(), 1..200),
        capacity in 1usize..20,
    ) {
        let mut store = CacheStore::with_max_entries(capacity);

        for (i, key) in keys.into_iter().enumerate() {
            store.put(key, i, i as u64);
            prop_assert!(store.len() <= capacity);
        }
    }

    // Freshness is exactly `now - stored_at < ttl`.
    #[test]
    fn prop_freshness_boundary(stored_at in 0u64..1_000_000, ttl_ms in 0u64..1_000_000, elapsed in 0u64..2_000_000) {
        let entry = CacheEntry::new("k", (), stored_at);
        let fresh = CacheStore::is_fresh(&entry, Duration::from_millis(ttl_ms), stored_at + elapsed);
        prop_assert_eq!(fresh, elapsed < ttl_ms);
    }

    // The sweep removes exactly the entries older than the retention horizon.
    #[test]
    fn prop_purge_removes_only_old_entries(
        ages in prop::collection::vec(0u64..20_000, 1..40),
        retention_ms in 1u64..20_000,
    ) {
        let now = 20_000u64;
        let mut store = CacheStore::new();
        for (i, age) in ages.iter().enumerate() {
            store.put(format!("key{i}"), i, now - age);
        }

        let expected_removed = ages.iter().filter(|age| **age >= retention_ms).count();
        let removed = store.purge_older_than(Duration::from_millis(retention_ms), now);

        prop_assert_eq!(removed, expected_removed);
        prop_assert_eq!(store.len(), ages.len() - expected_removed);
    }
}
