//! Cache Store Module
//!
//! Main cache engine: one lookup table kept in sync with two ordered lists.
//!
//! - The recency list is reordered on every read and write (LRU order).
//! - The freshness list is reordered only on write (write-time order).
//!
//! When a new key arrives at full capacity, the least recently written entry
//! is reclaimed if it has expired; otherwise the least recently used entry is
//! evicted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, NodeId, OrderedList, SystemClock};
use crate::config::{CacheConfig, DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::error::{CacheError, Result};

/// Arena slot: the entry plus its position in each list.
#[derive(Debug)]
struct Slot<V> {
    entry: CacheEntry<V>,
    recency: NodeId,
    freshness: NodeId,
}

/// Upper bound on storage reserved up front; larger caches grow on demand.
const MAX_PREALLOCATED: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvictionReason {
    Expired,
    LeastRecentlyUsed,
}

// == Cache Store ==
/// Bounded key/value cache with LRU eviction and TTL expiry.
///
/// Expiry is lazy: entries are checked only when read or considered for
/// eviction. The store is single-threaded; wrap it in one lock if it must be
/// shared.
#[derive(Debug)]
pub struct CacheStore<V, C = SystemClock> {
    /// Key to arena slot index
    table: HashMap<String, usize>,
    /// Entry arena, `None` for free slots
    slots: Vec<Option<Slot<V>>>,
    /// Recycled arena indices
    free_slots: Vec<usize>,
    /// Arena indices, most recently accessed first
    recency: OrderedList<usize>,
    /// Arena indices, most recently written first
    freshness: OrderedList<usize>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of resident entries
    capacity: usize,
    /// Freshness window
    ttl: Duration,
    clock: C,
}

impl<V> CacheStore<V, SystemClock> {
    // == Constructor ==
    /// Creates a new CacheStore using the system clock.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold (at least 1)
    /// * `ttl` - How long an entry stays valid after its last write (non-zero)
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        Self::with_clock(capacity, ttl, SystemClock)
    }

    /// Creates a new CacheStore from a loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.capacity, config.ttl)
    }
}

impl<V> Default for CacheStore<V, SystemClock> {
    /// Capacity 20, TTL ten minutes.
    fn default() -> Self {
        Self::build(DEFAULT_CAPACITY, DEFAULT_TTL, SystemClock)
    }
}

impl<V, C: Clock> CacheStore<V, C> {
    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(capacity: usize, ttl: Duration, clock: C) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }

        debug!(capacity, ttl_secs = ttl.as_secs_f64(), "cache store created");
        Ok(Self::build(capacity, ttl, clock))
    }

    fn build(capacity: usize, ttl: Duration, clock: C) -> Self {
        let initial = capacity.min(MAX_PREALLOCATED);
        Self {
            table: HashMap::with_capacity(initial),
            slots: Vec::with_capacity(initial),
            free_slots: Vec::new(),
            recency: OrderedList::with_capacity(initial),
            freshness: OrderedList::with_capacity(initial),
            stats: CacheStats::new(),
            capacity,
            ttl,
            clock,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit moves the key to the front of the recency list; its write time is
    /// left untouched. An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let Some(&idx) = self.table.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let now = self.clock.now();
        if self.is_expired_at(idx, now) {
            self.detach(idx);
            self.stats.record_expiration();
            self.stats.record_miss();
            trace!(key, "entry expired on read");
            return None;
        }

        let slot = self.slots.get_mut(idx)?.as_mut()?;
        self.recency.remove(slot.recency);
        slot.recency = self.recency.push_front(idx);
        self.stats.record_hit();
        Some(&slot.entry.value)
    }

    // == Set ==
    /// Stores a key-value pair, stamping it with the current time.
    ///
    /// Overwriting an existing key always succeeds and resets both its recency
    /// and its freshness, even if the previous value had expired. Inserting a
    /// new key into a full cache evicts exactly one entry first.
    ///
    /// # Errors
    /// Returns [`CacheError::EmptyKey`] for an empty key; the cache is unchanged.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let now = self.clock.now();

        if let Some(&idx) = self.table.get(&key) {
            if let Some(slot) = self.slots.get_mut(idx).and_then(Option::as_mut) {
                self.recency.remove(slot.recency);
                self.freshness.remove(slot.freshness);
                slot.entry = CacheEntry::new(key, value, now);
                slot.recency = self.recency.push_front(idx);
                slot.freshness = self.freshness.push_front(idx);
                return Ok(());
            }

            // Dangling table entry: drop it and store the key as new
            warn!(key = %key, idx, "table entry pointed at a free slot");
            self.table.remove(&key);
        }

        if self.table.len() >= self.capacity {
            self.evict_one(now);
        }

        let idx = match self.free_slots.pop() {
            Some(idx) => idx,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        let recency = self.recency.push_front(idx);
        let freshness = self.freshness.push_front(idx);
        self.table.insert(key.clone(), idx);
        self.slots[idx] = Some(Slot {
            entry: CacheEntry::new(key, value, now),
            recency,
            freshness,
        });

        Ok(())
    }

    // == Remove ==
    /// Removes an entry by key, returning its value whether or not it had expired.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = *self.table.get(key)?;
        self.detach(idx).map(|entry| entry.value)
    }

    // == Time To Live ==
    /// Remaining validity of `key`, or `None` if absent or expired.
    ///
    /// Does not affect recency.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let slot = self.slot(*self.table.get(key)?)?;
        let now = self.clock.now();
        if slot.entry.is_expired(now, self.ttl) {
            return None;
        }
        Some(slot.entry.ttl_remaining(now, self.ttl))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.table.len());
        stats
    }

    /// Returns the current number of entries, expired ones included until reclaimed.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    // == Settings ==
    /// Returns the maximum number of resident entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the freshness window applied to every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Eviction ==
    /// Frees one slot: the stalest entry if it has expired, otherwise the LRU one.
    fn evict_one(&mut self, now: Instant) {
        let stale = self
            .freshness
            .peek_back()
            .copied()
            .filter(|&idx| self.is_expired_at(idx, now));

        let (victim, reason) = match stale {
            Some(idx) => (Some(idx), EvictionReason::Expired),
            None => (
                self.recency.peek_back().copied(),
                EvictionReason::LeastRecentlyUsed,
            ),
        };

        let Some(entry) = victim.and_then(|idx| self.detach(idx)) else {
            return;
        };

        match reason {
            EvictionReason::Expired => self.stats.record_expiration(),
            EvictionReason::LeastRecentlyUsed => self.stats.record_eviction(),
        }
        debug!(key = %entry.key, ?reason, "evicted entry to make room");
    }

    /// Unlinks a slot from both lists and the table in one step.
    fn detach(&mut self, idx: usize) -> Option<CacheEntry<V>> {
        let slot = self.slots.get_mut(idx)?.take()?;
        self.recency.remove(slot.recency);
        self.freshness.remove(slot.freshness);
        self.table.remove(&slot.entry.key);
        self.free_slots.push(idx);
        Some(slot.entry)
    }

    fn slot(&self, idx: usize) -> Option<&Slot<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn is_expired_at(&self, idx: usize, now: Instant) -> bool {
        self.slot(idx)
            .is_some_and(|slot| slot.entry.is_expired(now, self.ttl))
    }

    /// Checks that the table and both lists describe the same set of entries
    /// and that the freshness list is ordered by write time.
    ///
    /// Recency order has no stored timestamp; the property tests compare it
    /// against a reference model instead.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.recency.len(), self.table.len(), "recency list out of sync");
        assert_eq!(self.freshness.len(), self.table.len(), "freshness list out of sync");
        assert!(self.table.len() <= self.capacity, "capacity exceeded");

        // Each key owns one live node per list, and that node carries its slot
        for (key, &idx) in &self.table {
            let slot = self.slot(idx).expect("table points at a free slot");
            assert_eq!(&slot.entry.key, key);
            assert_eq!(
                self.recency.get(slot.recency),
                Some(&idx),
                "stale recency handle for {key}"
            );
            assert_eq!(
                self.freshness.get(slot.freshness),
                Some(&idx),
                "stale freshness handle for {key}"
            );
        }

        let write_times: Vec<Instant> = self
            .freshness
            .iter()
            .map(|&idx| self.slot(idx).expect("listed slot is free").entry.written_at)
            .collect();
        assert!(
            write_times.windows(2).all(|w| w[0] >= w[1]),
            "freshness list not ordered by write time"
        );
    }

    /// Keys front to back in recency order.
    #[cfg(test)]
    pub(crate) fn recency_keys(&self) -> Vec<String> {
        self.recency
            .iter()
            .filter_map(|&idx| self.slot(idx).map(|slot| slot.entry.key.clone()))
            .collect()
    }

    /// Keys front to back in write order.
    #[cfg(test)]
    pub(crate) fn freshness_keys(&self) -> Vec<String> {
        self.freshness
            .iter()
            .filter_map(|&idx| self.slot(idx).map(|slot| slot.entry.key.clone()))
            .collect()
    }
}
