//! # QuantaraX Cryptography Library
//!
//! Cryptographic primitives for the QuantaraX file transfer engine: X25519
//! key exchange, HKDF-SHA256 session key derivation, AES-256-GCM AEAD,
//! Ed25519 signatures, BLAKE3 hashing and Merkle trees, and memory hygiene
//! (zeroization, constant-time comparison) for key material.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod hash;
pub mod kdf;
pub mod kem;
pub mod keys;
pub mod mem;
pub mod sig;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use keys::session::SessionKeys;

/// Library version constant
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the cryptography library (e.g., prevent core dumps).
///
/// Should be called once at process startup.
pub fn init() -> Result<()> {
    mem::wipe::prevent_core_dumps()?;
    Ok(())
}
