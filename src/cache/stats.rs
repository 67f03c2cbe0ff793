//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Cache Stats ==
/// Persisted performance counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of live entries evicted to stay within the byte budget
    pub evictions: u64,
    /// Number of lookups, hits and misses together
    pub total_requests: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate as `hits / max(total_requests, 1)`.
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.total_requests.max(1) as f64
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.total_requests += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.total_requests += 1;
    }

    /// Turns an already recorded hit into a miss, for a hit the caller could
    /// not use.
    pub fn reclassify_hit_as_miss(&mut self) {
        if self.hits > 0 {
            self.hits -= 1;
            self.misses += 1;
        }
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Stats Report ==
/// Point-in-time view of a store, as returned by `stats()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    /// Live (non-expired) entries
    pub entry_count: usize,
    pub current_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_requests: u64,
}

impl StatsReport {
    pub(crate) fn new(
        counters: &CacheStats,
        entry_count: usize,
        current_size_bytes: u64,
        max_size_bytes: u64,
    ) -> Self {
        Self {
            entry_count,
            current_size_bytes,
            max_size_bytes,
            hit_rate: counters.hit_rate(),
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            total_requests: counters.total_requests,
        }
    }

    pub fn current_size_mb(&self) -> f64 {
        self.current_size_bytes as f64 / BYTES_PER_MB
    }

    pub fn max_size_mb(&self) -> f64 {
        self.max_size_bytes as f64 / BYTES_PER_MB
    }
}
