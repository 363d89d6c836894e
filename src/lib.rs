//! LRU/TTL Cache - a bounded, time-aware key/value cache
//!
//! Combines recency-of-access (LRU) eviction with absolute freshness (TTL)
//! expiry. Expired entries are reclaimed before valid ones when room is needed.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, CacheStore, Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
