//! Tiered Cache
//!
//! A bounded [`LockedCache`] used as a near cache in front of a slower,
//! larger [`SlowStore`].
//!
//! # Ordering
//! - Writes go to the slow store first; the near cache is only populated once
//!   the slow store accepted the data.
//! - Reads try the near cache, then fall through to the slow store and
//!   repopulate the near cache with the slow store's remaining TTL.
//! - Expiry discovered in the near cache only invalidates the near cache; the
//!   slow store stays authoritative.

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::cache::{LockedCache, Lookup, Ttl};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tiered::{Codec, JsonCodec, SlowStore};

/// Predicate deciding which error `get_ignore_not_found` turns into `Ok(None)`.
pub type ErrorMatcher = Box<dyn Fn(&CacheError) -> bool + Send + Sync>;

// == Builder ==
/// Builder for [`TieredCache`].
pub struct TieredCacheBuilder<S, C = JsonCodec> {
    store: S,
    max_entries: usize,
    default_ttl: Duration,
    prefix: String,
    codec: C,
    mute: Option<ErrorMatcher>,
}

impl<S> TieredCacheBuilder<S>
where
    S: SlowStore,
{
    /// # Arguments
    /// * `store` - The slow store
    /// * `max_entries` - Capacity of the near cache
    /// * `default_ttl` - TTL used by `set` when none is given
    pub fn new(store: S, max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            store,
            max_entries,
            default_ttl,
            prefix: String::new(),
            codec: JsonCodec,
            mute: None,
        }
    }

    /// Takes capacity, default TTL and key prefix from a [`Config`].
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store, config.max_entries, config.default_ttl).prefix(config.key_prefix.clone())
    }
}

impl<S, C> TieredCacheBuilder<S, C>
where
    S: SlowStore,
{
    /// Prefix prepended to every key in both tiers.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replaces the codec used by `get`/`set`.
    pub fn codec<C2>(self, codec: C2) -> TieredCacheBuilder<S, C2> {
        TieredCacheBuilder {
            store: self.store,
            max_entries: self.max_entries,
            default_ttl: self.default_ttl,
            prefix: self.prefix,
            codec,
            mute: self.mute,
        }
    }

    /// Designates the error that `get_ignore_not_found` reports as no data.
    pub fn mute_error<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&CacheError) -> bool + Send + Sync + 'static,
    {
        self.mute = Some(Box::new(matcher));
        self
    }

    /// Mutes [`CacheError::NotFound`].
    pub fn mute_not_found(self) -> Self {
        self.mute_error(CacheError::is_not_found)
    }

    /// Validates the parameters and builds the cache.
    pub fn build(self) -> Result<TieredCache<S, C>> {
        let near = LockedCache::new(self.max_entries, self.default_ttl)?;
        debug!(
            "Tiered cache created: prefix={:?}, near_capacity={}, default_ttl={:?}",
            self.prefix, self.max_entries, self.default_ttl
        );
        Ok(TieredCache {
            prefix: self.prefix,
            default_ttl: self.default_ttl,
            near,
            store: self.store,
            codec: self.codec,
            mute: self.mute,
        })
    }
}

// == Tiered Cache ==
/// Two-tier cache: a bounded near cache over a durable slow store.
pub struct TieredCache<S, C = JsonCodec> {
    /// Prepended to every raw key
    prefix: String,
    /// TTL used when `set` gets none
    default_ttl: Duration,
    /// Bounded fast tier holding encoded bytes
    near: LockedCache<String, Vec<u8>>,
    /// Durable tier
    store: S,
    codec: C,
    mute: Option<ErrorMatcher>,
}

impl<S> TieredCache<S>
where
    S: SlowStore,
{
    /// Starts a [`TieredCacheBuilder`] with the JSON codec and no prefix.
    pub fn builder(store: S, max_entries: usize, default_ttl: Duration) -> TieredCacheBuilder<S> {
        TieredCacheBuilder::new(store, max_entries, default_ttl)
    }
}

impl<S, C> TieredCache<S, C>
where
    S: SlowStore,
{
    // == Keys ==
    /// Resolves a raw key to the key used in both tiers.
    pub fn namespaced_key(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        Ok(format!("{}{}", self.prefix, key))
    }

    // == Get ==
    /// Reads and decodes a value, near cache first.
    pub async fn get<T>(&self, key: &str) -> Result<T>
    where
        C: Codec<T>,
    {
        let key = self.namespaced_key(key)?;
        let bytes = self.fetch_bytes(&key).await?;
        self.codec.decode(&bytes)
    }

    /// Like [`get`](Self::get), but the muted error becomes `Ok(None)`.
    pub async fn get_ignore_not_found<T>(&self, key: &str) -> Result<Option<T>>
    where
        C: Codec<T>,
    {
        match self.get(key).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.is_muted(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Reads raw bytes without decoding.
    pub async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let key = self.namespaced_key(key)?;
        self.fetch_bytes(&key).await
    }

    // == Set ==
    /// Encodes and stores a value in the slow store, then in the near cache.
    ///
    /// `ttl` of `None` or zero uses the default TTL.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        C: Codec<T>,
    {
        let key = self.namespaced_key(key)?;
        let bytes = self.codec.encode(value)?;
        self.store_bytes(&key, bytes, ttl).await
    }

    /// Stores raw bytes without encoding.
    pub async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let key = self.namespaced_key(key)?;
        self.store_bytes(&key, value, ttl).await
    }

    // == Delete ==
    /// Removes the key from the near cache, then from the slow store.
    ///
    /// Returns the slow store's deletion count.
    pub async fn delete(&self, key: &str) -> Result<u64> {
        let key = self.namespaced_key(key)?;
        self.near.remove(&key);
        self.store.delete(&key).await.map_err(CacheError::from_store)
    }

    // == TTL ==
    /// Remaining lifetime, from the near cache when it holds the key.
    pub async fn ttl(&self, key: &str) -> Result<Duration> {
        let key = self.namespaced_key(key)?;
        match self.near.ttl(&key) {
            Ttl::Remaining(remaining) => Ok(remaining),
            // Not in the near cache: it may have been evicted for space
            Ttl::Missing | Ttl::Expired => {
                self.store.ttl(&key).await.map_err(CacheError::from_store)
            }
        }
    }

    /// Whether `err` matches the configured mute policy.
    pub fn is_muted(&self, err: &CacheError) -> bool {
        self.mute.as_ref().is_some_and(|matcher| matcher(err))
    }

    pub fn near_cache(&self) -> &LockedCache<String, Vec<u8>> {
        &self.near
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    async fn fetch_bytes(&self, key: &str) -> Result<Vec<u8>> {
        match self.near.get(key) {
            Lookup::Fresh(bytes) if !bytes.is_empty() => {
                trace!("Near cache hit for {}", key);
                return Ok(bytes);
            }
            Lookup::Expired(_) => debug!("Near cache entry for {} expired", key),
            _ => debug!("Near cache miss for {}", key),
        }

        let bytes = self.store.get(key).await.map_err(CacheError::from_store)?;
        if !bytes.is_empty() {
            // A failed TTL lookup only skips repopulation
            let ttl = match self.store.ttl(key).await {
                Ok(ttl) => ttl,
                Err(err) => {
                    debug!("Slow store ttl lookup for {} failed: {}", key, err);
                    Duration::ZERO
                }
            };
            if !ttl.is_zero() {
                self.near.add(key.to_string(), bytes.clone(), Some(ttl));
            }
        }
        Ok(bytes)
    }

    async fn store_bytes(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);

        if let Err(err) = self.store.set(key, &value, ttl).await {
            warn!("Slow store rejected write for {}: {}", key, err);
            return Err(CacheError::from_store(err));
        }
        self.near.add(key.to_string(), value, Some(ttl));
        Ok(())
    }
}

impl<S, C> fmt::Debug for TieredCache<S, C>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("prefix", &self.prefix)
            .field("default_ttl", &self.default_ttl)
            .field("near", &self.near)
            .field("store", &self.store)
            .field("mute", &self.mute.is_some())
            .finish()
    }
}
