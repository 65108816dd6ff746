//! LRU TTL - bounded in-process caching
//!
//! Provides an LRU cache with lazy per-entry TTL expiry, a two-tier cache
//! that puts it in front of a slower durable store, and a sharded variant
//! for lower lock contention.

pub mod cache;
pub mod config;
pub mod error;
pub mod sharded;
pub mod tiered;

pub use cache::{CacheStats, ExpiringCache, LockedCache, Lookup, LruStore, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
pub use sharded::ShardedCache;
pub use tiered::{Codec, JsonCodec, MemoryStore, RawCodec, SlowStore, TieredCache};
