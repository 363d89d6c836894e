//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A missing or expired key is
//! not an error: lookups report it as `None`.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must allow at least one resident entry
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// TTL must be strictly positive
    #[error("Invalid TTL: {0:?} (must be greater than zero)")]
    InvalidTtl(Duration),

    /// A configuration value could not be parsed
    #[error("Invalid configuration value for {name}: {value:?}")]
    InvalidConfig {
        /// Name of the offending setting
        name: &'static str,
        /// Raw value as supplied
        value: String,
    },

    /// Keys must be non-empty
    #[error("Cache key must not be empty")]
    EmptyKey,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
