//! Unified error type for the transfer engine.

use thiserror::Error;

/// Errors surfaced by the send/receive engine, wrapping every layer it
/// drives: wire protocol, transport, crypto, and persistent storage.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Protocol(#[from] quantarax_protocol::ProtocolError),

    #[error(transparent)]
    Transport(#[from] quantarax_transport::TransportError),

    #[error(transparent)]
    Crypto(#[from] quantarax_crypto::CryptoError),

    #[error(transparent)]
    Store(#[from] quantarax_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("the peer's manifest signature did not verify")]
    ManifestNotTrusted,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transfer cancelled")]
    Cancelled,

    #[error("medical domain profile requires end-to-end encryption, which is always on, but the peer rejected the strict-mode handshake: {0}")]
    MedicalStrictViolation(String),
}

/// Result type for the transfer engine.
pub type Result<T> = std::result::Result<T, EngineError>;
