//! Error types for the tweet-sentiment library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur while collecting, scoring or persisting tweets.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The remote API rejected the supplied credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A caller-supplied argument is out of range or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport, HTTP status or payload failure talking to the remote API
    #[error("Remote fetch error: {0}")]
    RemoteFetch(String),

    /// Store failure that is not a plain SQLite error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sentiment lexicon missing or malformed
    #[error("Lexicon error: {0}")]
    Lexicon(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `PipelineError`
pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteFetch(err.to_string())
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
