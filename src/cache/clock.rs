//! Clock Module
//!
//! Time sources used for `stored_at` timestamps and freshness checks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;

// == Clock Trait ==
/// A monotonically non-decreasing millisecond time source.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current time in milliseconds.
    fn now_ms(&self) -> u64;
}

// == System Clock ==
/// Wall-clock time (Unix milliseconds) clamped so it never runs backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    /// Highest value handed out so far
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let wall = Utc::now().timestamp_millis().max(0) as u64;
        // fetch_max returns the previous value; the result is whichever is larger
        let prev = self.last.fetch_max(wall, Ordering::AcqRel);
        prev.max(wall)
    }
}

// == Manual Clock ==
/// A clock that only moves when told to. Used for deterministic freshness tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Moves the clock to `ms`. Earlier values are ignored.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::AcqRel);
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
