//! Transport-layer error types

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport-layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Dialing a peer failed to establish a connection
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// A stream was reset by the peer or closed with an error code
    #[error("stream reset: code={code} reason={reason}")]
    StreamReset {
        /// Application error code the peer supplied
        code: u32,
        /// Human-readable reason, if any
        reason: String,
    },

    /// An operation exceeded its deadline
    #[error("operation timed out")]
    TimedOut,

    /// TLS configuration or handshake failure
    #[error("TLS error: {0}")]
    TlsError(String),

    /// The connection was closed locally or remotely
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
