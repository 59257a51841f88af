//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, expiries and
//! durability counters.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of reads that found an entry already past its deadline
    pub expired_reads: u64,
    /// Number of entries removed by explicit eviction
    pub evictions: u64,
    /// Number of entries removed by expiry sweeps
    pub swept: u64,
    /// Number of durable-buffer appends that failed
    pub buffer_failures: u64,
    /// Number of buffer records replayed into the backing store
    pub replayed: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
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

    pub fn record_expired_read(&mut self) {
        self.expired_reads += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn record_buffer_failure(&mut self) {
        self.buffer_failures += 1;
    }

    pub fn record_replayed(&mut self, count: usize) {
        self.replayed += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
