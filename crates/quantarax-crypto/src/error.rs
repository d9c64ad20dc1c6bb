//! Error types for cryptographic operations

use thiserror::Error;

/// Result type alias using CryptoError
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material was the wrong size for the operation
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected key size
        expected: usize,
        /// Actual key size
        actual: usize,
    },

    /// Nonce was the wrong size for the operation
    #[error("invalid nonce size: expected {expected} bytes, got {actual}")]
    InvalidNonceSize {
        /// Expected nonce size
        expected: usize,
        /// Actual nonce size
        actual: usize,
    },

    /// AEAD tag verification failed on open
    #[error("AEAD authentication failed")]
    AuthenticationFailed,

    /// ECDH produced an all-zero shared secret (low-order point)
    #[error("ECDH produced an all-zero shared secret")]
    ZeroSharedSecret,

    /// Signature did not verify against the given message and public key
    #[error("signature verification failed")]
    InvalidSignature,

    /// Error during key generation
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Hash mismatch detected
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Expected hash value (hex)
        expected: String,
        /// Actual hash value (hex)
        actual: String,
    },

    /// I/O error during a cryptographic operation
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for CryptoError {
    fn from(e: std::io::Error) -> Self {
        CryptoError::Io(e.to_string())
    }
}

impl From<bincode::Error> for CryptoError {
    fn from(e: bincode::Error) -> Self {
        CryptoError::Serialization(e.to_string())
    }
}
