//! Cache Key Module
//!
//! Builds cache keys from an operation name and its arguments.

use std::fmt::Display;

use serde::Serialize;

/// Default per-argument bound, in characters.
pub const DEFAULT_ARG_LIMIT: usize = 100;

const SEPARATOR: char = ':';

// == Key Builder ==
/// Joins an operation name and its arguments with `:`.
///
/// Each argument is cut to a prefix of at most `limit` characters, so large
/// payloads such as base64 images only contribute their first bytes. Two
/// payloads sharing that prefix map to the same key.
///
/// ```
/// use quota_cache::KeyBuilder;
///
/// let key = KeyBuilder::new("forgeAffiliateFunnel")
///     .arg("solar panels")
///     .arg("homeowners")
///     .arg("AU")
///     .build();
/// assert_eq!(key, "forgeAffiliateFunnel:solar panels:homeowners:AU");
/// ```
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    key: String,
    limit: usize,
}

impl KeyBuilder {
    pub fn new(operation: &str) -> Self {
        Self {
            key: operation.to_string(),
            limit: DEFAULT_ARG_LIMIT,
        }
    }

    /// Sets the truncation bound for arguments appended afterwards.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn arg(mut self, value: impl Display) -> Self {
        let rendered = value.to_string();
        self.key.push(SEPARATOR);
        self.key.push_str(truncate_arg(&rendered, self.limit));
        self
    }

    /// Appends an optional argument; `None` renders as an empty segment.
    pub fn opt_arg<D: Display>(self, value: Option<D>) -> Self {
        match value {
            Some(value) => self.arg(value),
            None => self.arg(""),
        }
    }

    /// Appends the JSON serialization of a structured argument.
    ///
    /// Structs serialize their fields in declaration order, which keeps the
    /// key stable. Use ordered maps for map-like arguments.
    pub fn json_arg<S: Serialize + ?Sized>(self, value: &S) -> serde_json::Result<Self> {
        let rendered = serde_json::to_string(value)?;
        Ok(self.arg(rendered))
    }

    pub fn build(self) -> String {
        self.key
    }
}

// == Truncate ==
/// Returns the first `limit` characters of `value`.
pub fn truncate_arg(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((byte_idx, _)) => &value[..byte_idx],
        None => value,
    }
}
