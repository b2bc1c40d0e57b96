//! Exec Module
//!
//! The cached execution wrapper, its failure classifier and the helpers
//! call sites use to build keys and parse upstream responses.

mod classifier;
mod executor;
mod key;
mod response;


pub use classifier::{ErrorClassifier, FailureKind, TextMatchClassifier};
pub use executor::{Coalescing, Executor};
pub use key::{truncate_arg, KeyBuilder, DEFAULT_ARG_LIMIT};
pub use response::{parse_json, parse_json_or_default, MalformedResponse};
