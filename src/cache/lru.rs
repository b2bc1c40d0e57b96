//! LRU Tracker Module
//!
//! Tracks recency of cache keys so a bounded store can evict the least
//! recently used entry.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the key with a new tick. `order` maps tick -> key, so
/// the first element is always the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Latest tick per key
    ticks: HashMap<String, u64>,
    /// Keys ordered by their latest tick
    order: BTreeMap<u64, String>,
    /// Monotonic access counter
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unseen.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(old) => {
                self.order.remove(old);
                *old = tick;
            }
            None => {
                self.ticks.insert(key.to_string(), tick);
            }
        }
        self.order.insert(tick, key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.values().next()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}
