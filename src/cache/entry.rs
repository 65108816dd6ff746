//! Cache Entry Module
//!
//! Defines stored entries with an absolute expiry, plus the result types of
//! TTL-aware lookups.

use std::time::{Duration, Instant};

// Fallback horizon when `now + ttl` overflows the platform clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// A stored value with its absolute, monotonic expiry.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Point in time at which the entry stops being served
    pub expires_at: Instant,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an entry expiring `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is greater
    /// than or equal to its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime, or `None` once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
    }
}

// == Lookup ==
/// Outcome of a TTL-aware lookup.
///
/// An expired entry still hands back its stale value for diagnostics, but it
/// is not a hit: [`Lookup::is_found`] is the only authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Present and unexpired
    Fresh(V),
    /// Present but past its expiry
    Expired(V),
    /// Not in the cache
    Missing,
}

impl<V> Lookup<V> {
    // == Predicates ==
    /// True only for a fresh entry; expired entries are misses.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }

    /// True when the entry was present but past its expiry.
    pub fn is_expired(&self) -> bool {
        matches!(self, Lookup::Expired(_))
    }

    // == Accessors ==
    /// The value regardless of freshness.
    pub fn value(&self) -> Option<&V> {
        match self {
            Lookup::Fresh(value) | Lookup::Expired(value) => Some(value),
            Lookup::Missing => None,
        }
    }

    /// The value only if it is fresh.
    pub fn into_fresh(self) -> Option<V> {
        match self {
            Lookup::Fresh(value) => Some(value),
            _ => None,
        }
    }
}

// == Ttl ==
/// Remaining lifetime of a key as seen by `peek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key is not stored
    Missing,
    /// The key is stored but already expired
    Expired,
    /// Time left before the entry expires
    Remaining(Duration),
}

impl Ttl {
    /// Time left, only for [`Ttl::Remaining`].
    pub fn remaining(self) -> Option<Duration> {
        match self {
            Ttl::Remaining(remaining) => Some(remaining),
            _ => None,
        }
    }

    /// Redis-style seconds: `-2` missing, `-1` expired, whole seconds left otherwise.
    pub fn as_seconds(self) -> i64 {
        match self {
            Ttl::Missing => -2,
            Ttl::Expired => -1,
            Ttl::Remaining(remaining) => i64::try_from(remaining.as_secs()).unwrap_or(i64::MAX),
        }
    }
}
