//! Response Parsing Module
//!
//! Helpers producers use to turn upstream response text into typed values.
//!
//! [`parse_json`] is the strict path: an empty or unparsable body becomes a
//! [`MalformedResponse`], which the executor classifies as `Malformed` and
//! never caches. [`parse_json_or_default`] keeps the legacy behavior of
//! answering with an empty value when the body is missing; callers that use it
//! accept that the empty value will be cached like any other success. A body
//! that is present but not JSON is malformed on both paths.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

// == Malformed Response ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed upstream response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
}

impl MalformedResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// == Strict Parse ==
/// Parses a JSON body, failing on a missing, blank or invalid body.
pub fn parse_json<T: DeserializeOwned>(text: Option<&str>) -> Result<T, MalformedResponse> {
    let body = non_blank(text).ok_or_else(|| MalformedResponse::new("empty response body"))?;
    parse_body(body)
}

// == Lenient Parse ==
/// Parses a JSON body, answering `T::default()` when the body is missing or
/// blank. Invalid JSON still fails.
pub fn parse_json_or_default<T: DeserializeOwned + Default>(
    text: Option<&str>,
) -> Result<T, MalformedResponse> {
    match non_blank(text) {
        Some(body) => parse_body(body),
        None => {
            warn!("Substituting empty value for missing response body");
            Ok(T::default())
        }
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|body| !body.is_empty())
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, MalformedResponse> {
    serde_json::from_str(body).map_err(|err| MalformedResponse::new(err.to_string()))
}
