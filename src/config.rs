//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Environment variable holding the maximum number of resident entries.
pub const CAPACITY_VAR: &str = "CACHE_CAPACITY";

/// Environment variable holding the freshness window in seconds.
pub const TTL_VAR: &str = "CACHE_TTL_SECS";

/// Default maximum number of resident entries.
pub const DEFAULT_CAPACITY: usize = 20;

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Time an entry stays valid after its last write
    pub ttl: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum resident entries (default: 20)
    /// - `CACHE_TTL_SECS` - Freshness window in seconds, fractions allowed (default: 600)
    ///
    /// Unset variables fall back to their defaults. Set but malformed or
    /// non-positive values are rejected.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let capacity = match lookup(CAPACITY_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(CAPACITY_VAR, &raw))?,
            None => DEFAULT_CAPACITY,
        };

        let ttl = match lookup(TTL_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| invalid(TTL_VAR, &raw))?,
            None => DEFAULT_TTL,
        };

        let config = Self { capacity, ttl };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would silently always-evict or never-retain.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.ttl.is_zero() {
            return Err(CacheError::InvalidTtl(self.ttl));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, raw: &str) -> CacheError {
    CacheError::InvalidConfig {
        name,
        value: raw.to_string(),
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}
