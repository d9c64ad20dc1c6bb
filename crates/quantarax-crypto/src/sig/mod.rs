//! Digital signatures
//!
//! Ed25519, used for long-term peer identity and for signing transfer
//! manifests.

pub mod ed25519;

pub use ed25519::Ed25519Signer;
