//! Error types for the patchwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for patchwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the patchwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// App list could not be loaded (run-fatal: no target list, no run)
    #[error("App list error: {0}")]
    AppList(String),

    /// Feed fetch errors (entity-scoped; the orchestrator degrades these
    /// to a NoData classification for the affected app)
    #[error("Feed fetch error: {0}")]
    Fetch(String),

    /// Messaging channel errors
    #[error("Channel error: {0}")]
    Channel(String),

    /// State store errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem / network I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an app list error
    pub fn app_list(msg: impl Into<String>) -> Self {
        Self::AppList(msg.into())
    }

    /// Create a feed fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
