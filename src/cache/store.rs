//! Cache Store Module
//!
//! Key-addressed storage of producer results with an optional LRU bound.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Holds at most one entry per key. Writes always overwrite.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key -> entry storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Recency tracking, only consulted when `max_entries` is set
    lru: LruTracker,
    /// Counters
    stats: CacheStats,
    /// Capacity bound; `None` keeps every key ever written
    max_entries: Option<usize>,
}

impl<T> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheStore<T> {
    // == Constructors ==
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: None,
        }
    }

    /// Creates a store that evicts the least recently used entry once
    /// `max_entries` is reached. A bound of 0 means unbounded.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: (max_entries > 0).then_some(max_entries),
            ..Self::new()
        }
    }

    // == Get ==
    /// Pure lookup. Does not touch recency or counters.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Is Fresh ==
    /// `now - entry.stored_at < ttl`
    pub fn is_fresh(entry: &CacheEntry<T>, ttl: Duration, now: u64) -> bool {
        entry.is_fresh(ttl, now)
    }

    // == Put ==
    /// Stores `value` under `key` timestamped `now`, replacing any previous entry.
    ///
    /// When the store is bounded and full, a new key evicts the least recently
    /// used entry first. Overwrites never evict.
    pub fn put(&mut self, key: impl Into<String>, value: T, now: u64) {
        let key = key.into();
        let is_overwrite = self.entries.contains_key(&key);

        if let Some(max) = self.max_entries {
            if !is_overwrite && self.entries.len() >= max {
                if let Some(evicted) = self.lru.evict_oldest() {
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                    debug!(key = %evicted, "evicted least recently used entry");
                }
            }
        }

        self.lru.touch(&key);
        self.entries
            .insert(key.clone(), CacheEntry::new(key, value, now));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Purge Older Than ==
    /// Drops every entry older than `retention`. Returns the number removed.
    pub fn purge_older_than(&mut self, retention: Duration, now: u64) -> usize {
        let stale: Vec<String> = self
            .entries
            .values()
            .filter(|entry| !entry.is_fresh(retention, now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &stale {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_swept(stale.len());
        self.stats.set_total_entries(self.entries.len());
        stale.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> CacheStore<T> {
    // == Lookup Fresh ==
    /// Returns a clone of the value under `key` if it is fresh for `ttl`.
    ///
    /// Counts a hit or a miss and marks the key as recently used on a hit.
    /// Stale entries are left in place; the next successful `put` replaces them.
    pub fn lookup_fresh(&mut self, key: &str, ttl: Duration, now: u64) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(ttl, now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }
}
