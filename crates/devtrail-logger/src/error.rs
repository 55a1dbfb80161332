//! Error types for the logging pipeline.
//!
//! These errors stay inside the crate's public [`Logger`](crate::Logger)
//! surface: backends return them, the logger reports and contains them.

use devtrail_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while persisting or reading records.
#[derive(Debug, Error)]
pub enum LogError {
    /// The store is unreachable or misconfigured.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A record or a store response could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error talking to the search index.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search index answered with a non-success status.
    #[error("unexpected response from search index (status {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LogError {
    /// Whether this error means the log file does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Map a transport failure, treating refused connections and timeouts as
    /// an unavailable backend.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::BackendUnavailable(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}
