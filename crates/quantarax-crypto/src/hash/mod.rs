//! Cryptographic hash functions and utilities
//!
//! BLAKE3 hashing and the Merkle tree used to derive a manifest's root hash.

pub mod blake3;
pub mod merkle;

pub use self::blake3::{derive_key, hash, keyed_hash};
pub use merkle::{merkle_root, MerkleProof, MerkleTree};
