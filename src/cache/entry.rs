//! Cache Entry Module
//!
//! Defines the record stored for each resident key.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A key, its value, and the instant of its most recent write.
///
/// Reads never touch `written_at`; only a write creates a new entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Instant of the write that produced this entry
    pub written_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with `written_at`.
    pub fn new(key: String, value: V, written_at: Instant) -> Self {
        Self {
            key,
            value,
            written_at,
        }
    }

    // == Age ==
    /// Time elapsed since the entry was written, zero if `now` precedes it.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.written_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// Boundary condition: an entry whose age is exactly `ttl` is expired.
    /// The same comparison is used by reads and by the eviction step.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }

    // == Time To Live ==
    /// Remaining validity, `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self, now: Instant, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.age(now))
    }
}
