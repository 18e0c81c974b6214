//! Property-Based Tests for Cache Module
//!
//! Uses proptest with a manual clock so expiration is deterministic.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{SetOutcome, TtlStore};
use crate::events::EventKind;
use crate::timer::ManualTimer;

// == Test Configuration ==
const TEST_DEFAULT_TTL_MS: u64 = 300;

fn manual_store() -> (TtlStore<String>, ManualTimer) {
    let timer = ManualTimer::starting_at(1_700_000_000_000);
    let store = TtlStore::with_timer(
        Duration::from_millis(TEST_DEFAULT_TTL_MS),
        Arc::new(timer.clone()),
    );
    (store, timer)
}

fn expired_keys(store: &TtlStore<String>) -> Arc<Mutex<Vec<String>>> {
    let expired = Arc::new(Mutex::new(Vec::new()));
    let log = expired.clone();
    store.subscribe(EventKind::Expired, move |event| {
        log.lock().push(event.key.clone())
    });
    expired
}

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

fn ttl_strategy() -> impl Strategy<Value = u64> {
    1u64..10_000
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Advance { ms: u64 },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| StoreOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| StoreOp::Get { key }),
        valid_key_strategy().prop_map(|key| StoreOp::Delete { key }),
        (0u64..400).prop_map(|ms| StoreOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: a positive-TTL set is immediately readable.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in ttl_strategy()
    ) {
        let (store, _) = manual_store();

        let outcome = store.set_with_ttl(key.clone(), value.clone(), Duration::from_millis(ttl));
        prop_assert_eq!(outcome, SetOutcome::Stored);
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // Expiration: once ttl has elapsed the key is gone, and its timer
    // published `expired` exactly once.
    #[test]
    fn prop_expiration(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in ttl_strategy()
    ) {
        let (store, timer) = manual_store();
        let expired = expired_keys(&store);

        store.set_with_ttl(key.clone(), value, Duration::from_millis(ttl));
        timer.advance(Duration::from_millis(ttl));

        prop_assert_eq!(store.get(&key), None);
        prop_assert_eq!(expired.lock().clone(), vec![key]);
    }

    // Capacity: the (N+1)-th distinct key is dropped and size stays N.
    #[test]
    fn prop_capacity_enforcement(
        keys in prop::collection::hash_set(valid_key_strategy(), 2..40),
        capacity in 1usize..20
    ) {
        let (store, _) = manual_store();
        store.set_capacity(capacity);
        let drops = Arc::new(Mutex::new(0usize));
        let counter = drops.clone();
        store.subscribe(EventKind::Drop, move |_| *counter.lock() += 1);

        for key in &keys {
            store.set(key.clone(), "value".to_string());
            prop_assert!(store.len() <= capacity);
        }

        prop_assert_eq!(store.len(), keys.len().min(capacity));
        prop_assert_eq!(*drops.lock(), keys.len().saturating_sub(capacity));
    }

    // Replacement: the last value wins and the first entry's timer never
    // fires, even when it was due earlier.
    #[test]
    fn prop_replacement_cancels_old_timer(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy(),
        ttl1 in ttl_strategy(),
        ttl2 in ttl_strategy()
    ) {
        let (store, timer) = manual_store();
        let expired = expired_keys(&store);

        store.set_with_ttl(key.clone(), value1, Duration::from_millis(ttl1));
        store.set_with_ttl(key.clone(), value2.clone(), Duration::from_millis(ttl2));
        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);

        timer.advance(Duration::from_millis(ttl2 - 1));
        prop_assert!(expired.lock().is_empty(), "Old timer fired after replacement");

        timer.advance(Duration::from_millis(1));
        prop_assert_eq!(expired.lock().len(), 1);
    }

    // Deletion cancels the timer: no `expired` ever follows a delete.
    #[test]
    fn prop_delete_cancels_timer(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in ttl_strategy()
    ) {
        let (store, timer) = manual_store();
        let expired = expired_keys(&store);

        store.set_with_ttl(key.clone(), value.clone(), Duration::from_millis(ttl));
        prop_assert_eq!(store.delete(&key), Some(value));

        timer.advance(Duration::from_millis(ttl * 2));
        prop_assert!(expired.lock().is_empty());
        prop_assert_eq!(timer.pending(), 0);
    }

    // Clear removes everything with one `del` per key.
    #[test]
    fn prop_clear_removes_all(keys in prop::collection::hash_set(valid_key_strategy(), 0..30)) {
        let (store, _) = manual_store();
        for key in &keys {
            store.set(key.clone(), "value".to_string());
        }

        let deleted = Arc::new(Mutex::new(HashSet::new()));
        let log = deleted.clone();
        store.subscribe(EventKind::Del, move |event| {
            log.lock().insert(event.key.clone());
        });

        store.clear();
        prop_assert_eq!(store.len(), 0);
        prop_assert_eq!(deleted.lock().clone(), keys);
    }

    // Any interleaving of operations keeps hit/miss counters in step with
    // what `get` returned, and no expired value is ever handed out.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let (store, timer) = manual_store();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set(key, value);
                }
                StoreOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                StoreOp::Delete { key } => {
                    store.delete(&key);
                }
                StoreOp::Advance { ms } => {
                    timer.advance(Duration::from_millis(ms));
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
        prop_assert_eq!(store.keys().len(), store.len(), "Order tracker out of sync");
    }
}
