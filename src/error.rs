//! Error types for the graphite bridge.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while parsing a label template string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed placeholder in template {template:?}")]
    UnclosedPlaceholder { template: String },

    #[error("Unmatched '}}' in template {template:?}")]
    UnmatchedBrace { template: String },

    #[error("Empty placeholder in template {template:?}")]
    EmptyPlaceholder { template: String },
}

/// Errors raised while encoding a snapshot into the wire format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Template for metric {metric:?} references unknown placeholder {placeholder:?}")]
    MissingPlaceholder { metric: String, placeholder: String },
}

/// Errors raised by a single push attempt.
///
/// Both encoding and transport failures surface here; the scheduler treats
/// them uniformly (log, skip the cycle, keep the cadence).
#[derive(Debug, Error)]
pub enum PushError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Could not connect to graphite at {address}: {source}")]
    Connect { address: String, source: io::Error },

    #[error("Push to graphite at {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("Failed to write payload to graphite at {address}: {source}")]
    Write { address: String, source: io::Error },
}
