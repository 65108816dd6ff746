//! Sharded Cache Module
//!
//! Spreads keys over independent [`LockedCache`] shards to reduce lock
//! contention. LRU order is only kept per shard, and aggregate views are
//! not atomic across shards.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use ahash::RandomState;
use tracing::debug;

use crate::cache::{CacheStats, LockedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};

// Fixed seeds keep shard selection stable for the lifetime of the cache.
const SHARD_SEEDS: (u64, u64, u64, u64) = (
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
);

// == Sharded Cache ==
/// Fixed set of expiring caches selected by a hash of the key.
pub struct ShardedCache<K, V> {
    shards: Vec<LockedCache<K, V>>,
    hasher: RandomState,
}

impl<K, V> ShardedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Builds `shard_count` shards of `ceil(max_entries / shard_count)` entries each.
    ///
    /// Requires `shard_count > 0`, `max_entries > shard_count` and a non-zero TTL.
    pub fn new(shard_count: usize, max_entries: usize, default_ttl: Duration) -> Result<Self> {
        if shard_count == 0 || max_entries <= shard_count {
            return Err(CacheError::InvalidParameters(format!(
                "shard count ({}) must be greater than 0 and less than max entries ({})",
                shard_count, max_entries
            )));
        }
        if default_ttl.is_zero() {
            return Err(CacheError::InvalidParameters(
                "default ttl must be greater than 0".to_string(),
            ));
        }

        let per_shard = max_entries.div_ceil(shard_count);
        let shards = (0..shard_count)
            .map(|_| LockedCache::new(per_shard, default_ttl))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Sharded cache created: shards={}, entries_per_shard={}, default_ttl={:?}",
            shard_count, per_shard, default_ttl
        );
        let (k0, k1, k2, k3) = SHARD_SEEDS;
        Ok(Self {
            shards,
            hasher: RandomState::with_seeds(k0, k1, k2, k3),
        })
    }

    /// Like [`new`](Self::new), with one eviction callback shared by every shard.
    pub fn with_eviction_callback<F>(
        shard_count: usize,
        max_entries: usize,
        default_ttl: Duration,
        callback: F,
    ) -> Result<Self>
    where
        F: Fn(K, V) + Send + Sync + 'static,
        K: 'static,
        V: 'static,
    {
        let cache = Self::new(shard_count, max_entries, default_ttl)?;
        let callback = Arc::new(callback);
        for shard in &cache.shards {
            let callback = Arc::clone(&callback);
            shard.set_eviction_callback(move |key, value| callback(key, value));
        }
        Ok(cache)
    }

    /// Uses `shard_count`, `max_entries` and `default_ttl` from a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_sharded()?;
        Self::new(config.shard_count, config.max_entries, config.default_ttl)
    }
}

impl<K, V> ShardedCache<K, V> {
    // == Shard Selection ==
    /// Index of the shard owning `key`.
    pub fn shard_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        (BuildHasher::hash_one(&self.hasher, key) % self.shards.len() as u64) as usize
    }

    /// The shard owning `key`; issue every operation for that key against it.
    pub fn pick_shard<Q>(&self, key: &Q) -> &LockedCache<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        &self.shards[self.shard_index(key)]
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// All shards, in index order.
    pub fn shards(&self) -> &[LockedCache<K, V>] {
        &self.shards
    }
}

impl<K, V> ShardedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Aggregates ==
    /// Sum of unexpired entries over all shards, read one shard at a time.
    pub fn len(&self) -> usize {
        self.shards.iter().map(LockedCache::len).sum()
    }

    /// True when no shard holds an unexpired entry.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(LockedCache::is_empty)
    }

    /// Unexpired keys of every shard, shard by shard.
    pub fn keys(&self) -> Vec<K> {
        self.shards.iter().flat_map(LockedCache::keys).collect()
    }

    /// Empties every shard, one at a time. No eviction callbacks fire.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }

    /// Statistics summed over all shards.
    pub fn stats(&self) -> CacheStats {
        self.shards.iter().fold(CacheStats::new(), |mut total, shard| {
            total.merge(&shard.stats());
            total
        })
    }
}

impl<K, V> fmt::Debug for ShardedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCache")
            .field("shard_count", &self.shards.len())
            .finish_non_exhaustive()
    }
}
