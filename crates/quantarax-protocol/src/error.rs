//! Protocol-layer error types

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol-layer errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A caller-supplied argument was invalid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transfer token failed to parse or round-trip
    #[error("invalid transfer token")]
    InvalidToken,

    /// A manifest failed structural or signature validation
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// A frame's magic number did not match
    #[error("invalid magic number")]
    InvalidMagic,

    /// A frame or message used a protocol version this build does not support
    #[error("unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(u8),

    /// A chunk frame's session id did not match the active session
    #[error("session id mismatch")]
    SessionIdMismatch,

    /// A frame or control message could not be parsed
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A chunk's plaintext did not hash to its manifest entry
    #[error("hash mismatch for chunk {index}")]
    HashMismatch {
        /// Index of the mismatching chunk
        index: u32,
    },

    /// The Merkle root computed at finalization did not match the manifest
    #[error("merkle root mismatch")]
    MerkleMismatch,

    /// Corruption was detected that is not a simple hash mismatch
    #[error("corruption detected: {0}")]
    CorruptionDetected(String),

    /// Referenced a session id the store does not know about
    #[error("session not found")]
    SessionNotFound,

    /// Attempted to add a session id that already exists
    #[error("session already exists")]
    SessionExists,

    /// Attempted an illegal session state transition
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        /// Originating state
        from: String,
        /// Attempted destination state
        to: String,
    },

    /// A manifest lacked required policy attributes under a strict domain profile
    #[error("medical strict policy violation: manifest lacks {0}")]
    MedicalStrictViolation(String),

    /// Reed-Solomon reconstruction could not recover the shard set
    #[error("too many missing shards: {missing} missing, at most {max_recoverable} recoverable")]
    TooManyMissingShards {
        /// Number of shards that were missing
        missing: usize,
        /// Maximum number of shards that could have been recovered
        max_recoverable: usize,
    },

    /// FEC parameters were out of the supported range
    #[error("invalid FEC parameters: K={k}, R={r}")]
    InvalidFECParameters {
        /// Data shard count
        k: usize,
        /// Parity shard count
        r: usize,
    },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    IOError(String),

    /// Durable storage failure
    #[error("storage error: {0}")]
    StorageError(String),

    /// A bounded queue rejected an item because it was full
    #[error("queue full")]
    QueueFull,
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedFrame(err.to_string())
    }
}

impl From<quantarax_crypto::CryptoError> for ProtocolError {
    fn from(err: quantarax_crypto::CryptoError) -> Self {
        use quantarax_crypto::CryptoError as C;
        match err {
            C::InvalidSignature => ProtocolError::InvalidManifest("signature verification failed".into()),
            other => ProtocolError::InvalidManifest(other.to_string()),
        }
    }
}
