//! Locked Cache Module
//!
//! Thread-safe decorator around [`ExpiringCache`].

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::{BoundedStore, CacheStats, Entry, ExpiringCache, Lookup, LruStore, Ttl};
use crate::config::Config;
use crate::error::Result;

// == Locked Cache ==
/// An [`ExpiringCache`] guarded by its own reader-writer lock.
///
/// `add`, `remove` and `get` take the write lock (`get` reorders recency);
/// `peek`, `ttl`, enumeration and `stats` share the read lock. Every operation
/// is short and never blocks on I/O.
#[derive(Debug)]
pub struct LockedCache<K, V, S = LruStore<K, Entry<V>>> {
    inner: RwLock<ExpiringCache<K, V, S>>,
}

impl<K, V> LockedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a locked cache backed by an [`LruStore`].
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        ExpiringCache::new(capacity, default_ttl).map(Self::from)
    }

    /// Creates a locked cache from the `max_entries` and `default_ttl` of a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        ExpiringCache::from_config(config).map(Self::from)
    }
}

impl<K, V, S> From<ExpiringCache<K, V, S>> for LockedCache<K, V, S> {
    fn from(cache: ExpiringCache<K, V, S>) -> Self {
        Self {
            inner: RwLock::new(cache),
        }
    }
}

impl<K, V, S> LockedCache<K, V, S>
where
    S: BoundedStore<K, Entry<V>>,
{
    // == Eviction Callback ==
    /// See [`ExpiringCache::set_eviction_callback`].
    pub fn set_eviction_callback<F>(&self, callback: F)
    where
        F: FnMut(K, V) + Send + Sync + 'static,
        K: 'static,
        V: 'static,
    {
        self.inner.write().set_eviction_callback(callback);
    }

    // == Writes ==
    /// Stores a value under the write lock. See [`ExpiringCache::add`].
    pub fn add(&self, key: K, value: V, ttl: Option<Duration>) {
        self.inner.write().add(key, value, ttl);
    }

    /// Reads and promotes under the write lock, removing an expired entry.
    pub fn get<Q>(&self, key: &Q) -> Lookup<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.write().get(key)
    }

    // == Reads ==
    /// Reads under the read lock without promoting or removing.
    pub fn peek<Q>(&self, key: &Q) -> Lookup<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.read().peek(key)
    }

    /// Remaining lifetime of `key`, with peek semantics.
    pub fn ttl<Q>(&self, key: &Q) -> Ttl
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().ttl(key)
    }

    /// Removes an entry under the write lock.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().remove(key)
    }

    /// Drops every entry under the write lock. See [`ExpiringCache::clear`].
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    // == Enumeration ==
    /// Visits unexpired entries under the read lock.
    ///
    /// The visitor must not call back into this cache's write operations.
    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&K, &V),
    {
        self.inner.read().for_each(visit);
    }

    /// Unexpired keys from most to least recently used.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.read().keys()
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.read().default_ttl()
    }

    /// Snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats()
    }

    /// Unwraps the unsynchronized cache.
    pub fn into_inner(self) -> ExpiringCache<K, V, S> {
        self.inner.into_inner()
    }
}
