//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Counters ==
/// Running counters kept by a cache instance.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

// == Cache Stats ==
/// Diagnostic snapshot of a cache instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries physically present, including expired ones not yet swept
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Live entries dropped to make room for a new key
    pub evictions: u64,
    /// Expired entries removed, lazily or by a sweep
    pub expirations: u64,
    /// hits / (hits + misses), 0.0 before the first read
    pub hit_rate: f64,
    /// Estimated bytes held by keys and values
    pub memory_usage: usize,
}

impl CacheStats {
    pub(crate) fn from_counters(
        counters: Counters,
        size: usize,
        max_size: usize,
        memory_usage: usize,
    ) -> Self {
        Self {
            size,
            max_size,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expirations: counters.expirations,
            hit_rate: hit_rate(counters.hits, counters.misses),
            memory_usage,
        }
    }
}

// == Hit Rate ==
/// Returns hits / (hits + misses), or 0.0 if no reads have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_default() {
        let counters = Counters::default();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.evictions, 0);
        assert_eq!(counters.expirations, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(hit_rate(0, 0), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();

        let stats = CacheStats::from_counters(counters, 3, 10, 0);
        assert_eq!(stats.hit_rate, 0.75);
    }

    #[test]
    fn test_record_eviction_and_expirations() {
        let mut counters = Counters::default();
        counters.record_eviction();
        counters.record_expirations(4);

        let stats = CacheStats::from_counters(counters, 0, 10, 0);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 4);
    }
}
