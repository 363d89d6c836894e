//! Cache Module
//!
//! Provides a bounded in-memory cache with TTL freshness and LRU eviction.

mod clock;
mod entry;
mod list;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use list::{NodeId, OrderedList};
pub use stats::CacheStats;
pub use store::CacheStore;
