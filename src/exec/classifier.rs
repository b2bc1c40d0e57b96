//! Error Classifier Module
//!
//! Tags producer failures so callers can tell rate limiting apart from
//! everything else.

use std::fmt;
use std::sync::Arc;

use crate::error::ExecError;
use crate::exec::response::MalformedResponse;

// == Failure Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The upstream is rate limiting the caller
    QuotaExceeded,
    /// The upstream answered with something that could not be parsed
    Malformed,
    /// Anything else
    Unclassified,
}

// == Classifier Trait ==
/// Decides which [`FailureKind`] a producer failure belongs to.
pub trait ErrorClassifier: Send + Sync + fmt::Debug {
    fn classify(&self, failure: &anyhow::Error) -> FailureKind;

    /// Converts a producer failure into the error handed back to callers.
    ///
    /// Rate-limit failures lose their original text and carry `RATE_LIMIT`.
    /// Everything else keeps the original error untouched.
    fn into_exec_error(&self, failure: anyhow::Error) -> ExecError {
        match self.classify(&failure) {
            FailureKind::QuotaExceeded => ExecError::quota_exceeded(),
            FailureKind::Malformed => ExecError::Malformed(Arc::new(failure)),
            FailureKind::Unclassified => ExecError::Upstream(Arc::new(failure)),
        }
    }
}

// == Text Match Classifier ==
/// Substring heuristic over the failure's message chain.
///
/// Matching is case-sensitive. A [`MalformedResponse`] anywhere in the chain
/// wins over the text match.
#[derive(Debug, Clone)]
pub struct TextMatchClassifier {
    needles: Vec<String>,
}

impl TextMatchClassifier {
    /// Uses custom rate-limit indicators instead of `429` / `quota`.
    pub fn with_needles<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            needles: needles.into_iter().map(Into::into).collect(),
        }
    }

    fn mentions_rate_limit(&self, message: &str) -> bool {
        self.needles.iter().any(|needle| message.contains(needle.as_str()))
    }
}

impl Default for TextMatchClassifier {
    fn default() -> Self {
        Self::with_needles(["429", "quota"])
    }
}

impl ErrorClassifier for TextMatchClassifier {
    fn classify(&self, failure: &anyhow::Error) -> FailureKind {
        if failure.chain().any(|cause| cause.is::<MalformedResponse>()) {
            return FailureKind::Malformed;
        }
        if failure
            .chain()
            .any(|cause| self.mentions_rate_limit(&cause.to_string()))
        {
            return FailureKind::QuotaExceeded;
        }
        FailureKind::Unclassified
    }
}
