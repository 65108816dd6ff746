//! Slow Store
//!
//! The durable, larger tier behind a [`TieredCache`](crate::tiered::TieredCache).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::CacheError;

/// External store consulted when the near cache misses.
///
/// Implementations may block on I/O. Calls are cancelled by dropping the
/// returned future, so callers bound them with `tokio::time::timeout` or
/// similar; the tiered cache never holds its own lock across a call.
#[async_trait]
pub trait SlowStore: Send + Sync {
    /// Fetches the bytes stored under `key`.
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()>;

    /// Remaining lifetime of `key`; zero when there is no usable TTL.
    async fn ttl(&self, key: &str) -> anyhow::Result<Duration>;

    /// Deletes `key`, returning how many entries were removed.
    async fn delete(&self, key: &str) -> anyhow::Result<u64>;
}

#[async_trait]
impl<S> SlowStore for Arc<S>
where
    S: SlowStore + ?Sized,
{
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn ttl(&self, key: &str) -> anyhow::Result<Duration> {
        (**self).ttl(key).await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        (**self).delete(key).await
    }
}

// == Memory Store ==
/// In-process [`SlowStore`] with per-key expiry.
///
/// Missing or expired keys are reported as [`CacheError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entry<T>(&self, key: &str, read: impl FnOnce(&[u8], Instant) -> T) -> Option<T> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now => {
                return Some(read(value, *expires_at));
            }
            Some(_) => {}
            None => return None,
        }
        entries.remove(key);
        None
    }
}

#[async_trait]
impl SlowStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.live_entry(key, |value, _| value.to_vec())
            .ok_or_else(|| CacheError::NotFound(key.to_string()).into())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            CacheError::InvalidParameters(format!("ttl {ttl:?} is out of range"))
        })?;
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_vec(), expires_at));
        Ok(())
    }

    async fn ttl(&self, key: &str) -> anyhow::Result<Duration> {
        Ok(self
            .live_entry(key, |_, expires_at| {
                expires_at.saturating_duration_since(Instant::now())
            })
            .unwrap_or(Duration::ZERO))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        Ok(u64::from(self.entries.lock().remove(key).is_some()))
    }
}
