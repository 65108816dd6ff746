//! Expiring Cache Module
//!
//! Bounded LRU storage with lazy, per-entry TTL expiry. This type does no
//! locking of its own; see [`LockedCache`](crate::cache::LockedCache) for the
//! synchronized variant.

use std::borrow::Borrow;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::{BoundedStore, CacheStats, Entry, Lookup, LruStore, Ttl};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Expiring Cache ==
/// LRU cache whose entries expire lazily.
///
/// Expiry is only evaluated when an entry is touched. An expired entry keeps
/// its slot until `get` discovers it, it is removed, or capacity pressure
/// evicts it; enumeration and `len` never report it though.
#[derive(Debug)]
pub struct ExpiringCache<K, V, S = LruStore<K, Entry<V>>> {
    /// Recency-ordered backing store
    store: S,
    /// TTL applied when `add` gets no explicit TTL
    default_ttl: Duration,
    /// Performance statistics
    stats: CacheStats,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a cache backed by an [`LruStore`].
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL for entries added without an explicit TTL
    ///
    /// Both must be non-zero.
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        Self::with_store(LruStore::new(capacity)?, default_ttl)
    }

    /// Creates a cache from the `max_entries` and `default_ttl` of a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(config.max_entries, config.default_ttl)
    }
}

impl<K, V, S> ExpiringCache<K, V, S>
where
    S: BoundedStore<K, Entry<V>>,
{
    /// Wraps an existing bounded store.
    pub fn with_store(store: S, default_ttl: Duration) -> Result<Self> {
        if store.capacity() == 0 {
            return Err(CacheError::InvalidParameters(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if default_ttl.is_zero() {
            return Err(CacheError::InvalidParameters(
                "default ttl must be greater than 0".to_string(),
            ));
        }
        debug!(
            "Expiring cache created: capacity={}, default_ttl={:?}",
            store.capacity(),
            default_ttl
        );
        Ok(Self {
            store,
            default_ttl,
            stats: CacheStats::new(),
            _marker: PhantomData,
        })
    }

    /// Registers a callback for capacity evictions.
    ///
    /// It runs synchronously inside the `add` that caused the eviction. TTL
    /// expiry and explicit removal never invoke it.
    pub fn set_eviction_callback<F>(&mut self, mut callback: F)
    where
        F: FnMut(K, V) + Send + Sync + 'static,
        K: 'static,
        V: 'static,
    {
        self.store
            .set_eviction_callback(Box::new(move |key, entry: Entry<V>| {
                callback(key, entry.value)
            }));
    }

    // == Add ==
    /// Stores a value, replacing any previous one and resetting its TTL.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - TTL for this entry, `None` uses the default. `Some(Duration::ZERO)`
    ///   stores an already expired entry.
    pub fn add(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if self.store.add(key, Entry::new(value, ttl)) {
            self.stats.record_eviction();
            trace!("Capacity eviction while adding entry with ttl={:?}", ttl);
        }
    }

    // == Get ==
    /// Reads a value and marks it most recently used.
    ///
    /// An expired entry is removed and its stale value returned as
    /// [`Lookup::Expired`].
    pub fn get<Q>(&mut self, key: &Q) -> Lookup<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        match self.store.get(key) {
            None => {
                self.stats.record_miss();
                return Lookup::Missing;
            }
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Lookup::Fresh(value);
            }
            Some(_) => {}
        }

        match self.store.remove(key) {
            Some(entry) => {
                self.stats.record_expiration();
                trace!("Removed expired entry on read");
                Lookup::Expired(entry.value)
            }
            None => Lookup::Missing,
        }
    }

    // == Peek ==
    /// Reads a value without touching recency and without removing it when
    /// expired.
    pub fn peek<Q>(&self, key: &Q) -> Lookup<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        match self.store.peek(key) {
            None => Lookup::Missing,
            Some(entry) if entry.is_expired() => Lookup::Expired(entry.value.clone()),
            Some(entry) => Lookup::Fresh(entry.value.clone()),
        }
    }

    // == TTL ==
    /// Remaining lifetime of `key`, using peek semantics.
    pub fn ttl<Q>(&self, key: &Q) -> Ttl
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.store.peek(key) {
            None => Ttl::Missing,
            Some(entry) => entry.remaining().map_or(Ttl::Expired, Ttl::Remaining),
        }
    }

    // == Remove ==
    /// Removes an entry, expired or not.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.remove(key).map(|entry| entry.value)
    }

    // == Clear ==
    /// Drops every entry, expired or not, without firing the eviction callback.
    ///
    /// Statistics are kept.
    pub fn clear(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        debug!("Cleared {} entries", dropped);
    }

    // == Enumeration ==
    /// Visits unexpired entries from most to least recently used.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        let now = Instant::now();
        self.store.for_each(|key, entry| {
            if !entry.is_expired_at(now) {
                visit(key, &entry.value);
            }
        });
    }

    /// Unexpired keys from most to least recently used.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::new();
        self.for_each(|key, _| keys.push(key.clone()));
        keys
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(|_, _| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }
}
