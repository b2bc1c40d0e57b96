//! Configuration Module
//!
//! Loads executor settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::exec::Coalescing;

/// Default freshness window for cached producer results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Executor configuration.
///
/// All values can be configured via environment variables with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// TTL used when a call does not supply its own
    pub default_ttl: Duration,
    /// Capacity bound for the store, 0 = unbounded
    pub max_entries: usize,
    /// Entries older than this are dropped by the cleanup sweep
    pub retention: Duration,
    /// Interval between cleanup sweeps
    pub cleanup_interval: Duration,
    /// Whether concurrent calls for one key share a producer run
    pub coalescing: Coalescing,
    /// Upper bound on a single producer run, `None` = unbounded
    pub producer_deadline: Option<Duration>,
}

impl Config {
    /// Creates a Config from environment variables, falling back to the
    /// default for any variable that is missing or malformed.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_MAX_ENTRIES` - Store capacity, 0 = unbounded (default: 0)
    /// - `CACHE_RETENTION_MS` - Sweep horizon in milliseconds (default: the default TTL)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 60000)
    /// - `CACHE_COALESCE` - `true`/`false` (default: true)
    /// - `CACHE_PRODUCER_DEADLINE_MS` - Producer deadline in milliseconds (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok(), false).unwrap_or_default()
    }

    /// Like [`Config::from_env`] but reports the first malformed variable.
    pub fn from_env_strict() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), true)
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F, strict: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Config::default();

        let default_ttl = read(&lookup, "CACHE_DEFAULT_TTL_MS", strict)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.default_ttl);
        let retention = read(&lookup, "CACHE_RETENTION_MS", strict)?
            .map(Duration::from_millis)
            .unwrap_or(default_ttl);

        Ok(Self {
            default_ttl,
            max_entries: read(&lookup, "CACHE_MAX_ENTRIES", strict)?
                .unwrap_or(defaults.max_entries),
            retention,
            cleanup_interval: read(&lookup, "CACHE_CLEANUP_INTERVAL_MS", strict)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.cleanup_interval),
            coalescing: read::<bool, _>(&lookup, "CACHE_COALESCE", strict)?
                .map(Coalescing::from)
                .unwrap_or(defaults.coalescing),
            producer_deadline: read(&lookup, "CACHE_PRODUCER_DEADLINE_MS", strict)?
                .map(Duration::from_millis)
                .or(defaults.producer_deadline),
        })
    }
}

fn read<T, F>(lookup: &F, name: &'static str, strict: bool) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) if strict => Err(ConfigError::InvalidValue { name, value: raw }),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using default", name, raw);
            Ok(None)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_entries: 0,
            retention: DEFAULT_TTL,
            cleanup_interval: Duration::from_secs(60),
            coalescing: Coalescing::Enabled,
            producer_deadline: None,
        }
    }
}
