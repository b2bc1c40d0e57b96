//! Telemetry Module
//!
//! Installs the tracing subscriber used by hosts of the executor.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "quota_cache=info";

/// Installs a global fmt subscriber filtered by `RUST_LOG`.
///
/// Returns an error instead of panicking when a subscriber is already set,
/// so hosts and tests can call it more than once.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init_tracing();
        assert!(init_tracing().is_err());
    }
}
