//! Tiered Cache Module
//!
//! Near cache over an injected slow store, with pluggable codecs.

mod cache;
mod codec;
mod slow_store;

pub use cache::{ErrorMatcher, TieredCache, TieredCacheBuilder};
pub use codec::{Codec, JsonCodec, RawCodec};
pub use slow_store::{MemoryStore, SlowStore};
