//! Key derivation
//!
//! HKDF-SHA256, used to derive the session key material for a transfer from
//! an ECDH shared secret and the manifest hash.

pub mod hkdf;

pub use self::hkdf::derive;
