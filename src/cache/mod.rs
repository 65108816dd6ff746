//! Cache Module
//!
//! Bounded LRU storage with lazy TTL expiry, in unsynchronized and locked
//! flavours.

mod entry;
mod locked;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{Entry, Lookup, Ttl};
pub use locked::LockedCache;
pub use lru::{BoundedStore, EvictionCallback, Iter, LruStore};
pub use stats::CacheStats;
pub use store::ExpiringCache;
