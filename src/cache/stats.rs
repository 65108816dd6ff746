//! Cache Statistics Module
//!
//! Tracks hits, misses, expirations and evictions of an expiring cache.

use serde::Serialize;

// == Cache Stats ==
/// Counters recorded by `get` and `add`. `peek` never records anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a fresh value
    pub hits: u64,
    /// Lookups that found nothing usable (absent or expired)
    pub misses: u64,
    /// Expired entries discovered and removed by `get`
    pub expirations: u64,
    /// Entries evicted due to LRU capacity pressure
    pub evictions: u64,
    /// Unexpired entries at the time of the snapshot
    pub total_entries: usize,
}

impl CacheStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recording ==
    /// Records a lookup that returned a fresh value.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a lookup for an absent key.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// An expired read counts as a miss as well.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    /// Records a capacity eviction.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Sets the entry count of a snapshot.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    // == Merge ==
    /// Adds another snapshot into this one (used to aggregate shards).
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.expirations += other.expirations;
        self.evictions += other.evictions;
        self.total_entries += other.total_entries;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_expiration_counts_as_miss() {
        let mut stats = CacheStats::new();
        stats.record_expiration();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_merge() {
        let mut total = CacheStats {
            hits: 1,
            misses: 2,
            expirations: 0,
            evictions: 3,
            total_entries: 4,
        };
        let mut other = CacheStats::new();
        other.record_hit();
        other.record_expiration();
        other.record_eviction();
        other.set_total_entries(6);

        total.merge(&other);
        assert_eq!(total.hits, 2);
        assert_eq!(total.misses, 3);
        assert_eq!(total.expirations, 1);
        assert_eq!(total.evictions, 4);
        assert_eq!(total.total_entries, 10);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats::new();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 0);
        assert_eq!(json["total_entries"], 0);
    }
}
