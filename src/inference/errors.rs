//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility — these types carry the context needed to build
//! meaningful log entries. No layer retries on any of these.

use thiserror::Error;

/// Errors that can occur while talking to the generation service or decoding
/// what it returned.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The service could not be reached, or the exchange broke down in transit
    /// (connect failure, timeout, unreadable body, HTTP 5xx).
    #[error("transport error talking to {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The service declined to answer: safety filtering, quota, or a 4xx.
    #[error("service rejected the request{}: {reason}", fmt_status(.status))]
    ServiceRejection { status: Option<u16>, reason: String },

    /// The service answered but the payload was empty.
    #[error("generation service returned no payload")]
    EmptyResponse,

    /// A payload was returned but does not deserialize into the expected structure.
    #[error("payload does not match the expected schema: {reason}")]
    SchemaViolation {
        reason: String,
        raw_response: String,
    },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl InferenceError {
    /// Short, stable label for the error kind. Used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Transport { .. } => "transport",
            InferenceError::ServiceRejection { .. } => "service_rejection",
            InferenceError::EmptyResponse => "empty_response",
            InferenceError::SchemaViolation { .. } => "schema_violation",
            InferenceError::ConfigError { .. } => "config",
        }
    }

    /// The HTTP status attached to a rejection, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            InferenceError::ServiceRejection { status, .. } => *status,
            _ => None,
        }
    }
}
