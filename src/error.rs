//! Error types for the cached execution layer
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Canonical message carried by every rate-limit failure.
pub const RATE_LIMIT_MESSAGE: &str = "RATE_LIMIT";

// == Exec Error Enum ==
/// Outcome of a failed `execute` call.
///
/// Cloneable so every caller sharing one in-flight producer receives the same
/// error. None of these outcomes is ever written to the cache.
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// The upstream signaled rate limiting. The original detail is discarded.
    #[error("{message}")]
    QuotaExceeded { message: String },

    /// The upstream answered but the response could not be parsed.
    #[error("{0}")]
    Malformed(Arc<anyhow::Error>),

    /// Any other producer failure, passed through unmodified.
    #[error("{0}")]
    Upstream(Arc<anyhow::Error>),

    /// The producer did not settle within the configured deadline.
    #[error("Producer exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// The caller's cancellation token fired before the producer settled.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ExecError {
    /// Builds the canonical rate-limit error.
    pub fn quota_exceeded() -> Self {
        ExecError::QuotaExceeded {
            message: RATE_LIMIT_MESSAGE.to_string(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ExecError::QuotaExceeded { .. })
    }

    /// The original producer failure, for upstream and malformed-response errors.
    pub fn source_error(&self) -> Option<&anyhow::Error> {
        match self {
            ExecError::Upstream(err) | ExecError::Malformed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

// == Config Error Enum ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

// == Result Type Alias ==
/// Convenience Result type for executor calls.
pub type Result<T> = std::result::Result<T, ExecError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_message() {
        let err = ExecError::quota_exceeded();
        assert!(err.is_quota_exceeded());
        assert_eq!(err.to_string(), "RATE_LIMIT");
    }

    #[test]
    fn test_upstream_displays_original_message() {
        let err = ExecError::Upstream(Arc::new(anyhow::anyhow!("Network unreachable")));
        assert_eq!(err.to_string(), "Network unreachable");
        assert_eq!(
            err.source_error().map(|e| e.to_string()),
            Some("Network unreachable".to_string())
        );
        assert!(!err.is_quota_exceeded());
    }

    #[test]
    fn test_clone_shares_source() {
        let err = ExecError::Upstream(Arc::new(anyhow::anyhow!("boom")));
        let copy = err.clone();
        match (&err, &copy) {
            (ExecError::Upstream(a), ExecError::Upstream(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected upstream errors"),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            name: "CACHE_DEFAULT_TTL_MS",
            value: "soon".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for CACHE_DEFAULT_TTL_MS: \"soon\""
        );
    }
}
