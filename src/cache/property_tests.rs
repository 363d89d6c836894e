//! Property-Based Tests for Cache Module
//!
//! Uses proptest with a manual clock, so expiry is exercised without sleeping.

use proptest::prelude::*;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{CacheStore, Clock, ManualClock};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(100);

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn small_key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}"
}

/// Generates a set of distinct keys
fn distinct_keys_strategy(size: std::ops::Range<usize>) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z0-9_]{1,16}", size)
        .prop_map(|keys| keys.into_iter().collect())
}

/// A single step applied to both the cache and the reference model
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Remove { key: String },
    Advance { secs: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (small_key_strategy(), any::<u32>())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        3 => small_key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => small_key_strategy().prop_map(|key| CacheOp::Remove { key }),
        2 => (0u64..60).prop_map(|secs| CacheOp::Advance { secs }),
    ]
}

fn new_store(capacity: usize) -> (CacheStore<u32, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let store = CacheStore::with_clock(capacity, TEST_TTL, clock.clone()).unwrap();
    (store, clock)
}

// == Reference Model ==
/// Linear-scan model of the eviction policy.
///
/// Every write and successful read takes a fresh tick, so the smallest
/// `written_tick` is the back of the freshness list and the smallest
/// `accessed_tick` is the back of the recency list.
#[derive(Debug)]
struct ModelEntry {
    key: String,
    value: u32,
    written_at: Duration,
    written_tick: u64,
    accessed_tick: u64,
}

#[derive(Debug)]
struct Model {
    capacity: usize,
    now: Duration,
    tick: u64,
    entries: Vec<ModelEntry>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            now: Duration::ZERO,
            tick: 0,
            entries: Vec::new(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn expired(&self, entry: &ModelEntry) -> bool {
        self.now - entry.written_at >= TEST_TTL
    }

    fn get(&mut self, key: &str) -> Option<u32> {
        let pos = self.entries.iter().position(|e| e.key == key)?;
        if self.expired(&self.entries[pos]) {
            self.entries.remove(pos);
            return None;
        }
        let tick = self.next_tick();
        let entry = &mut self.entries[pos];
        entry.accessed_tick = tick;
        Some(entry.value)
    }

    fn set(&mut self, key: &str, value: u32) {
        if let Some(pos) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(pos);
        } else if self.entries.len() >= self.capacity {
            let stalest = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.written_tick)
                .map(|(pos, _)| pos)
                .unwrap();
            let victim = if self.expired(&self.entries[stalest]) {
                stalest
            } else {
                self.entries
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| e.accessed_tick)
                    .map(|(pos, _)| pos)
                    .unwrap()
            };
            self.entries.remove(victim);
        }

        let tick = self.next_tick();
        self.entries.push(ModelEntry {
            key: key.to_string(),
            value,
            written_at: self.now,
            written_tick: tick,
            accessed_tick: tick,
        });
    }

    fn remove(&mut self, key: &str) -> Option<u32> {
        let pos = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(pos).value)
    }

    /// Keys ordered newest tick first, matching a list read front to back.
    fn keys_by(&self, tick: impl Fn(&ModelEntry) -> u64) -> Vec<String> {
        let mut entries: Vec<&ModelEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| Reverse(tick(e)));
        entries.into_iter().map(|e| e.key.clone()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every observable result matches the linear-scan model, and the table and
    // both lists stay in sync and in model order after each step.
    #[test]
    fn prop_matches_reference_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let (mut store, clock) = new_store(capacity);
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value).unwrap();
                    model.set(&key, value);
                }
                CacheOp::Get { key } => {
                    let actual = store.get(&key).copied();
                    let expected = model.get(&key);
                    prop_assert_eq!(actual, expected, "get({}) diverged", key);
                }
                CacheOp::Remove { key } => {
                    prop_assert_eq!(store.remove(&key), model.remove(&key));
                }
                CacheOp::Advance { secs } => {
                    clock.advance(Duration::from_secs(secs));
                    model.now += Duration::from_secs(secs);
                }
            }

            store.assert_invariants();
            prop_assert_eq!(store.len(), model.entries.len());
            prop_assert_eq!(store.recency_keys(), model.keys_by(|e| e.accessed_tick));
            prop_assert_eq!(store.freshness_keys(), model.keys_by(|e| e.written_tick));
        }
    }

    // Table size after each distinct insert is min(inserted, capacity).
    #[test]
    fn prop_capacity_bound(
        capacity in 1usize..20,
        keys in distinct_keys_strategy(1..60)
    ) {
        let (mut store, _clock) = new_store(capacity);

        for (inserted, key) in keys.into_iter().enumerate() {
            store.set(key, 0).unwrap();
            prop_assert_eq!(store.len(), (inserted + 1).min(capacity));
        }
    }

    // With no time passing, the overflowing insert evicts exactly the least
    // recently accessed key.
    #[test]
    fn prop_lru_eviction_order(
        keys in distinct_keys_strategy(2..10),
        accesses in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
        new_key in "[A-Z]{1,8}"
    ) {
        let capacity = keys.len();
        let (mut store, _clock) = new_store(capacity);

        // Front = most recently used
        let mut order: Vec<String> = Vec::new();
        for key in &keys {
            store.set(key.clone(), 0).unwrap();
            order.insert(0, key.clone());
        }
        for index in accesses {
            let key = index.get(&keys).clone();
            prop_assert!(store.get(&key).is_some());
            order.retain(|k| k != &key);
            order.insert(0, key);
        }

        let expected_victim = order.last().cloned().unwrap();
        store.set(new_key.clone(), 1).unwrap();

        prop_assert_eq!(store.len(), capacity);
        let resident: HashSet<String> = store.recency_keys().into_iter().collect();
        prop_assert!(!resident.contains(&expected_victim));
        prop_assert!(resident.contains(&new_key));
        for key in keys.iter().filter(|k| **k != expected_victim) {
            prop_assert!(resident.contains(key), "{} should not be evicted", key);
        }
        prop_assert_eq!(store.stats().evictions, 1);
    }

    // An expired entry is reclaimed ahead of colder but still valid entries.
    #[test]
    fn prop_stale_preferred_eviction(
        keys in distinct_keys_strategy(2..10),
        gap_secs in 1u64..99,
        hot_reads in prop::collection::vec(any::<prop::sample::Index>(), 1..30),
        new_key in "[A-Z]{1,8}"
    ) {
        let capacity = keys.len();
        let (mut store, clock) = new_store(capacity);
        let (stale_key, hot_keys) = keys.split_first().unwrap();

        store.set(stale_key.clone(), 0).unwrap();
        clock.advance(Duration::from_secs(gap_secs));
        for key in hot_keys {
            store.set(key.clone(), 0).unwrap();
        }
        // The soon-to-expire key becomes the most recently used
        prop_assert!(store.get(stale_key).is_some());

        clock.advance(TEST_TTL - Duration::from_secs(gap_secs));
        for index in hot_reads {
            prop_assert!(store.get(index.get(hot_keys).as_str()).is_some());
        }

        store.set(new_key.clone(), 1).unwrap();

        let resident: HashSet<String> = store.recency_keys().into_iter().collect();
        prop_assert!(!resident.contains(stale_key));
        for key in hot_keys {
            prop_assert!(resident.contains(key), "{} should survive", key);
        }
        prop_assert_eq!(store.stats().expirations, 1);
        prop_assert_eq!(store.stats().evictions, 0);
    }

    // Reads never extend an entry's lifetime.
    #[test]
    fn prop_read_does_not_refresh(
        steps in prop::collection::vec(0u64..20, 1..20)
    ) {
        let (mut store, clock) = new_store(4);
        let start = clock.now();
        store.set("a", 1).unwrap();

        for secs in steps {
            let next = clock.now() + Duration::from_secs(secs);
            if next - start >= TEST_TTL {
                break;
            }
            clock.advance(Duration::from_secs(secs));
            prop_assert_eq!(store.get("a"), Some(&1));
        }

        clock.set(start + TEST_TTL);
        prop_assert_eq!(store.get("a"), None);
    }
}
