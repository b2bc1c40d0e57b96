//! Cache Statistics Module
//!
//! Counters for lookups, producer invocations and failures.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that found no entry or a stale one
    pub misses: u64,
    /// Entries dropped to respect the capacity bound
    pub evictions: u64,
    /// Entries dropped by the retention sweep
    pub swept: u64,
    /// Times a producer was actually invoked
    pub producer_calls: u64,
    /// Callers that joined an in-flight producer instead of starting one
    pub coalesced: u64,
    /// Producer invocations that ended in an error of any kind
    pub failures: u64,
    /// Failures classified as rate limiting
    pub quota_exceeded: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before any lookup.
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

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn record_producer_call(&mut self) {
        self.producer_calls += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    /// Records a failed producer run; `quota` marks a rate-limit failure.
    pub fn record_failure(&mut self, quota: bool) {
        self.failures += 1;
        if quota {
            self.quota_exceeded += 1;
        }
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
