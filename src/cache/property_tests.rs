//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the cache core's behavioral properties across
//! generated keys, values and operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::cache::{CacheStore, TtlPolicy};

// == Test Configuration ==
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

fn test_store() -> CacheStore {
    let policy = TtlPolicy::new(TEST_DEFAULT_TTL, HashMap::new()).unwrap();
    CacheStore::new(policy)
}

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,64}".prop_map(|s| s)
}

/// Generates valid cache values (within size limit)
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Evict { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Evict { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, the hit/miss counters reflect
    // exactly the get results observed, and total_entries tracks the map.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = test_store();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key, value).unwrap();
                }
                CacheOp::Get { key } => {
                    match store.get(&key) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Evict { key } => {
                    store.evict(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // For any valid key-value pair, a put followed by a get (well inside
    // the default TTL) returns the stored value.
    #[test]
    fn prop_put_then_get(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut store = test_store();

        store.put(key.clone(), value.clone()).unwrap();

        prop_assert_eq!(store.get(&key), Some(value), "Put-then-get value mismatch");
    }

    // For any key present in the cache, evict makes a subsequent get
    // return absent regardless of remaining TTL.
    #[test]
    fn prop_evict_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut store = test_store();

        store.put(key.clone(), value).unwrap();
        prop_assert!(store.get(&key).is_some(), "Key should exist before evict");

        prop_assert!(store.evict(&key), "Evict should report removal");
        prop_assert_eq!(store.get(&key), None, "Key should be absent after evict");
    }

    // For any key, storing V1 and then V2 results in get returning V2.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        v1 in valid_value_strategy(),
        v2 in valid_value_strategy(),
    ) {
        let mut store = test_store();

        store.put(key.clone(), v1).unwrap();
        store.put(key.clone(), v2.clone()).unwrap();

        prop_assert_eq!(store.get(&key), Some(v2), "Overwrite should win");
        prop_assert_eq!(store.len(), 1, "Overwrite must not grow the cache");
    }

    // N puts of distinct keys leave exactly N live entries and never
    // corrupt the expiry index (size() agrees with len()).
    #[test]
    fn prop_distinct_puts_yield_exact_size(
        keys in prop::collection::hash_set("[a-z0-9]{1,32}", 1..40)
    ) {
        let mut store = test_store();

        for key in &keys {
            store.put(key.clone(), "v".to_string()).unwrap();
        }

        prop_assert_eq!(store.len(), keys.len());
        prop_assert_eq!(store.size(), keys.len(), "Nothing should expire under a 5m TTL");
    }

    // For any key with no override, resolution yields the default; for a
    // key with an exact override, resolution yields the override.
    #[test]
    fn prop_ttl_resolution(
        key in valid_key_strategy(),
        other in valid_key_strategy(),
        secs in 1u64..86_400,
    ) {
        prop_assume!(key != other);

        let mut overrides = HashMap::new();
        overrides.insert(key.clone(), Duration::from_secs(secs));
        let policy = TtlPolicy::new(TEST_DEFAULT_TTL, overrides).unwrap();

        prop_assert_eq!(policy.resolve(&key), Duration::from_secs(secs));
        // The only override is exact, so any other key falls back
        prop_assert_eq!(policy.resolve(&other), TEST_DEFAULT_TTL);
    }

    // Evicted keys never linger in the expiry index: interleaved puts and
    // evicts leave the index and the map the same size.
    #[test]
    fn prop_index_consistency_after_evictions(
        keys in prop::collection::vec("[a-z]{1,8}", 1..30)
    ) {
        let mut store = test_store();
        let mut live: HashSet<String> = HashSet::new();

        for (i, key) in keys.iter().enumerate() {
            if i % 3 == 2 {
                store.evict(key);
                live.remove(key);
            } else {
                store.put(key.clone(), "v".to_string()).unwrap();
                live.insert(key.clone());
            }
        }

        prop_assert_eq!(store.len(), live.len());
        prop_assert_eq!(store.size(), live.len());
    }
}
