//! Cache Entry Module
//!
//! Defines a single memoized producer result and its freshness predicate.

use std::time::Duration;

// == Cache Entry ==
/// A stored producer result together with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The key this entry is stored under
    pub key: String,
    /// The producer's successful result
    pub value: T,
    /// Write timestamp (clock milliseconds)
    pub stored_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    pub fn new(key: impl Into<String>, value: T, stored_at: u64) -> Self {
        Self {
            key: key.into(),
            value,
            stored_at,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was stored, saturating at zero.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks whether the entry is still valid for the given TTL.
    ///
    /// Boundary condition: an entry whose age equals the TTL is stale. Once
    /// the TTL has fully elapsed the producer must run again.
    pub fn is_fresh(&self, ttl: Duration, now: u64) -> bool {
        (self.age_ms(now) as u128) < ttl.as_millis()
    }
}
