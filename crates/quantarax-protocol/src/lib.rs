//! QuantaraX wire protocol: manifests, chunking, FEC, and the control channel
//!
//! Defines the manifest/Merkle data model, the Reed-Solomon FEC codec, the
//! length-prefixed control-channel message framing, the per-chunk wire
//! frame, range compression for ACK/NACK payloads, and the domain profile
//! table consumed by the sender orchestrator and autotuner.

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod fec;
pub mod transfer;
pub mod wire;

pub use error::ProtocolError;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
