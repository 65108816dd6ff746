//! Configuration Module
//!
//! Handles loading and validating cache parameters from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL for entries added without an explicit TTL
    pub default_ttl: Duration,
    /// Number of shards used by the sharded cache
    pub shard_count: usize,
    /// Prefix prepended to every key of a tiered cache
    pub key_prefix: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SHARD_COUNT` - Number of shards (default: 16)
    /// - `KEY_PREFIX` - Tiered cache key prefix (default: empty)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_entries: lookup("MAX_ENTRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            default_ttl: lookup("DEFAULT_TTL")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            shard_count: lookup("SHARD_COUNT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shard_count),
            key_prefix: lookup("KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }

    /// Checks the rules shared by every cache type: non-zero capacity and TTL.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidParameters(
                "max entries must be greater than 0".to_string(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidParameters(
                "default ttl must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), plus the sharded cache's rule
    /// `0 < shard_count < max_entries`.
    pub fn validate_sharded(&self) -> Result<()> {
        self.validate()?;
        if self.shard_count == 0 || self.max_entries <= self.shard_count {
            return Err(CacheError::InvalidParameters(format!(
                "shard count ({}) must be greater than 0 and less than max entries ({})",
                self.shard_count, self.max_entries
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(300),
            shard_count: 16,
            key_prefix: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.shard_count, 16);
        assert!(config.key_prefix.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("MAX_ENTRIES", "64"),
            ("DEFAULT_TTL", "5"),
            ("SHARD_COUNT", "4"),
            ("KEY_PREFIX", "users:"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.max_entries, 64);
        assert_eq!(config.default_ttl, Duration::from_secs(5));
        assert_eq!(config.shard_count, 4);
        assert_eq!(config.key_prefix, "users:");
    }

    #[test]
    fn test_config_unparsable_values_fall_back() {
        let config = Config::from_lookup(|name| match name {
            "MAX_ENTRIES" => Some("lots".to_string()),
            "DEFAULT_TTL" => Some("-3".to_string()),
            _ => None,
        });
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_config_validate_rejects_bad_values() {
        let zero_ttl = Config {
            default_ttl: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(
            zero_ttl.validate(),
            Err(CacheError::InvalidParameters(_))
        ));

        // The shard rule only applies to the sharded cache
        let too_many_shards = Config {
            max_entries: 8,
            ..Config::default()
        };
        assert!(too_many_shards.validate().is_ok());
        assert!(matches!(
            too_many_shards.validate_sharded(),
            Err(CacheError::InvalidParameters(_))
        ));
        assert!(Config::default().validate_sharded().is_ok());

        let empty = Config {
            max_entries: 0,
            ..Config::default()
        };
        assert!(empty.validate().is_err());
        assert!(empty.validate_sharded().is_err());
    }
}
