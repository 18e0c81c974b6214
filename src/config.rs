//! Configuration Module
//!
//! Handles loading store configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{Result, StoreError};

/// Default TTL applied when `set` is called without one (10 seconds).
pub const DEFAULT_TTL_MS: u64 = 10_000;

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Maximum number of distinct keys, `usize::MAX` = unbounded
    pub capacity: usize,
    /// Number of keys the demo binary writes
    pub demo_keys: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_DEFAULT_MS` - Default TTL in milliseconds (default: 10000)
    /// - `TTL_CAPACITY` - Maximum number of keys (default: unbounded)
    /// - `DEMO_KEYS` - Keys written by the demo binary (default: 3)
    pub fn from_env() -> Self {
        Self {
            default_ttl_ms: parse_var("TTL_DEFAULT_MS").unwrap_or(DEFAULT_TTL_MS),
            capacity: parse_var("TTL_CAPACITY").unwrap_or(usize::MAX),
            demo_keys: parse_var("DEMO_KEYS").unwrap_or(3),
        }
    }

    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Checks value ranges that `from_env` cannot reject on its own.
    pub fn validate(&self) -> Result<()> {
        if self.demo_keys == 0 {
            return Err(StoreError::InvalidConfig(
                "DEMO_KEYS must be at least 1".to_string(),
            ));
        }
        if u32::try_from(self.demo_keys).is_err() {
            return Err(StoreError::InvalidConfig(format!(
                "DEMO_KEYS must not exceed {}",
                u32::MAX
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            capacity: usize::MAX,
            demo_keys: 3,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
