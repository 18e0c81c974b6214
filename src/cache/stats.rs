//! Store Statistics Module
//!
//! Counts lifecycle transitions: hits, misses, drops, expirations, deletions.

use serde::Serialize;

// == Store Stats ==
/// Lifecycle counters, one per event kind that is worth counting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of `get` calls that returned a live value
    pub hits: u64,
    /// Number of `get` calls that found nothing (absent or expired)
    pub misses: u64,
    /// Number of new keys rejected at capacity
    pub drops: u64,
    /// Number of entries removed by their own timer
    pub expirations: u64,
    /// Number of entries removed for any reason
    pub deletions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl StoreStats {
    // == Constructor ==
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

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_drop(&mut self) {
        self.drops += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_deletion(&mut self) {
        self.deletions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StoreStats::new();
        assert_eq!(stats, StoreStats::default());
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(StoreStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = StoreStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_removal_counters() {
        let mut stats = StoreStats::new();
        stats.record_drop();
        stats.record_expiration();
        stats.record_deletion();
        stats.record_deletion();
        stats.set_total_entries(4);

        assert_eq!(stats.drops, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.deletions, 2);
        assert_eq!(stats.total_entries, 4);
    }
}
