//! Error types for fedicache
//!
//! All failures surfaced by the data layer are converted to `AppError`.
//! Fetch and mutation errors are returned to the caller; watch streams
//! never carry errors (recomposition failures are logged and retried on
//! the next change notification instead).

use serde::Deserialize;
use thiserror::Error;

/// Structured error body returned by Mastodon-compatible servers.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerReason {
    pub error: String,
    pub error_description: Option<String>,
}

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport-level failure talking to the remote service
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success response from the remote service, with the decoded
    /// structured body when one was present
    #[error("server returned status {status}")]
    Server {
        status: u16,
        reason: Option<ServerReason>,
    },

    /// Malformed response body
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Persistence backend failure (reads and writes)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (500-class catch-all)
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.into())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
