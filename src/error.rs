//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache layer.
///
/// The unit-like variants are the sentinels callers match on; foreign
/// slow-store failures are carried verbatim in [`CacheError::Store`].
#[derive(Error, Debug)]
pub enum CacheError {
    /// Construction parameters were rejected (capacity, TTL or shard count).
    #[error("Invalid cache parameters: {0}")]
    InvalidParameters(String),

    /// A tiered cache operation was given an empty key.
    #[error("Key is empty")]
    EmptyKey,

    /// Decoded bytes do not fit the requested type.
    #[error("Invalid decoded type: {0}")]
    InvalidType(String),

    /// Key not found in the slow store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The default codec failed to encode or decode a value.
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Any other slow-store failure, passed through untouched.
    #[error(transparent)]
    Store(anyhow::Error),
}

impl CacheError {
    /// Returns true for the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }

    /// Converts an error reported by a slow store.
    ///
    /// Stores that report a `CacheError` (such as `NotFound`) get it back
    /// unchanged so callers can match on the variant.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast::<CacheError>() {
            Ok(cache_err) => cache_err,
            Err(other) => CacheError::Store(other),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
