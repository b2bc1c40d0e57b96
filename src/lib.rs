//! Quota Cache - TTL memoization for calls to a rate-limited upstream
//!
//! Wraps asynchronous producers so repeated calls inside a freshness window
//! are answered from memory, concurrent calls for the same key share one
//! upstream request, and rate-limit failures are tagged for the caller.

pub mod cache;
pub mod config;
pub mod error;
pub mod exec;
pub mod tasks;
pub mod telemetry;

pub use cache::{CacheEntry, CacheStats, CacheStore, Clock, ManualClock, SystemClock};
pub use config::{Config, DEFAULT_TTL};
pub use error::{ConfigError, ExecError, Result, RATE_LIMIT_MESSAGE};
pub use exec::{
    parse_json, parse_json_or_default, Coalescing, ErrorClassifier, Executor, FailureKind,
    KeyBuilder, MalformedResponse, TextMatchClassifier,
};
pub use tasks::{
    poll_until_ready, poll_until_ready_with_progress, spawn_cleanup_task, PollError,
};
pub use telemetry::init_tracing;
