//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Configuration file is missing, unreadable, or fails to parse
    #[error("config error: {0}")]
    Config(String),

    /// The backing SQLite database rejected an operation
    #[error("storage error: {0}")]
    Storage(String),

    /// A session id was not found in the store
    #[error("session not found")]
    SessionNotFound,

    /// A session with this id already exists
    #[error("session already exists")]
    SessionExists,

    /// A transfer token failed to parse or had structurally invalid fields
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// JSON (de)serialization of a persisted value failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}
