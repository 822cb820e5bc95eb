//! Error types for the intro loader.

use thiserror::Error;

/// Result type alias for loader operations.
pub type IntroResult<T> = Result<T, IntroError>;

/// Errors that can occur while configuring or persisting the intro loader.
///
/// The sequencer itself never surfaces these to the page: storage failures
/// are logged and absorbed so the loader always reaches `Done`.
#[derive(Error, Debug)]
pub enum IntroError {
    /// Configuration rejected by validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Persistent storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntroError {
    /// Creates an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
