//! Symmetric AEAD
//!
//! AES-256-GCM with deterministic per-direction nonce derivation from the
//! session's `iv_base`.

pub mod aes_gcm;
pub mod nonce;

pub use aes_gcm::{open, seal};
pub use nonce::derive_nonce;
