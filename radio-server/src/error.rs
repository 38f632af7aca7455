//! Client error types.

use std::time::Duration;

/// Errors that can occur when talking to the directory mirrors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed (connection refused, TLS, body read, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request did not complete in time
    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Mirror returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// No provider with the given name is registered
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// The registry holds no providers at all
    #[error("no providers configured")]
    NoProviders,

    /// Mirror is unreachable for a reason other than the above
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    /// Build a timeout error from the elapsed budget.
    pub fn timeout(after: Duration) -> Self {
        ClientError::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }

    /// Build a JSON error, keeping a short prefix of the offending body.
    pub fn json(err: serde_json::Error, body: &str) -> Self {
        ClientError::Json {
            message: err.to_string(),
            body: Some(body.chars().take(500).collect()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
