//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify counter accuracy and the capacity bound over
//! arbitrary operation sequences.

use proptest::prelude::*;

use crate::cache::LocalStore;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const SMALL_CAPACITY: usize = 8;

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide often.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{1,8}".prop_map(|s| s)
}

/// Generates cache values.
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

/// A single cache operation.
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, the counters reflect exactly the
    // operations that occurred.
    #[test]
    fn prop_counter_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = LocalStore::new(TEST_MAX_ENTRIES);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut expected_sets: u64 = 0;
        let mut expected_removes: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key, value, None);
                    expected_sets += 1;
                }
                CacheOp::Get { key } => {
                    match store.get(&key) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Remove { key } => {
                    if store.remove(&key) {
                        expected_removes += 1;
                    }
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.sets, expected_sets, "Sets mismatch");
        prop_assert_eq!(stats.removes, expected_removes, "Removes mismatch");
    }

    // The store never exceeds its configured capacity, whatever the
    // operation sequence.
    #[test]
    fn prop_capacity_bound(ops in prop::collection::vec(cache_op_strategy(), 1..120)) {
        let mut store = LocalStore::new(SMALL_CAPACITY);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, None),
                CacheOp::Get { key } => { store.get(&key); }
                CacheOp::Remove { key } => { store.remove(&key); }
            }
            prop_assert!(store.len() <= SMALL_CAPACITY, "Capacity exceeded");
        }
    }

    // A get immediately after a set always observes the written value.
    #[test]
    fn prop_read_your_writes(key in key_strategy(), value in value_strategy()) {
        let mut store = LocalStore::new(TEST_MAX_ENTRIES);
        store.set(key.clone(), value.clone(), None);
        prop_assert_eq!(store.get(&key), Some(value));
    }
}
