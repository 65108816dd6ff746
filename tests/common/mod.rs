//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use lru_ttl::{MemoryStore, SlowStore};
use parking_lot::Mutex;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lru_ttl=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, thiserror::Error)]
#[error("slow store unavailable")]
pub struct Unavailable;

/// Slow store wrapper that counts calls, can fail each operation and reports
/// a fixed TTL, like a remote store under test.
#[derive(Debug, Default)]
pub struct InstrumentedStore {
    pub inner: MemoryStore,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub fail_writes: Mutex<bool>,
    pub fail_reads: Mutex<bool>,
    pub fail_ttl: Mutex<bool>,
    pub fail_deletes: Mutex<bool>,
    pub fixed_ttl: Mutex<Option<Duration>>,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed_ttl(ttl: Duration) -> Self {
        let store = Self::default();
        *store.fixed_ttl.lock() = Some(ttl);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    pub fn set_fail_ttl(&self, fail: bool) {
        *self.fail_ttl.lock() = fail;
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock() = fail;
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlowStore for InstrumentedStore {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if *self.fail_reads.lock() {
            return Err(Unavailable.into());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if *self.fail_writes.lock() {
            return Err(Unavailable.into());
        }
        self.inner.set(key, value, ttl).await
    }

    async fn ttl(&self, key: &str) -> anyhow::Result<Duration> {
        if *self.fail_ttl.lock() {
            return Err(Unavailable.into());
        }
        let fixed = *self.fixed_ttl.lock();
        match fixed {
            Some(ttl) => Ok(ttl),
            None => self.inner.ttl(key).await,
        }
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        if *self.fail_deletes.lock() {
            return Err(Unavailable.into());
        }
        self.inner.delete(key).await
    }
}
