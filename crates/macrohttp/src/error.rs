//! HTTP client error types

use serde_json::Value;
use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// Non-2xx status while status validation is on
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Payload rejected by an interceptor, not yet classified
    #[error("Rejected by interceptor: {0}")]
    Rejected(Value),

    /// Payload whose `code` field is not `0`
    #[error("Business failure: {0}")]
    Business(Value),

    /// URL template references a key the lookup object does not have
    #[error("Template variable not found: {0}")]
    MissingVariable(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl HttpError {
    /// Reject the current chain stage with a payload.
    ///
    /// The next stage settles it: a payload with `code == 0` is recovered,
    /// anything else turns into [`HttpError::Business`].
    pub fn reject(payload: impl Into<Value>) -> Self {
        HttpError::Rejected(payload.into())
    }

    /// Check if error is a business failure
    pub fn is_business(&self) -> bool {
        matches!(self, HttpError::Business(_))
    }

    /// Payload carried by a rejection or business failure
    pub fn payload(&self) -> Option<&Value> {
        match self {
            HttpError::Rejected(payload) | HttpError::Business(payload) => Some(payload),
            _ => None,
        }
    }
}
