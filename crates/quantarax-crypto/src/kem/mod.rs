//! Key exchange
//!
//! X25519 Diffie-Hellman, used for the per-session ephemeral handshake.

pub mod x25519;

pub use x25519::{SharedSecret, X25519KeyPair};
