//! Signing identity persistence

pub mod fingerprint;

pub use fingerprint::{fingerprint_emoji, fingerprint_hex, fingerprint_short};

use std::path::Path;

use quantarax_crypto::sig::Ed25519Signer;

use crate::Result;

/// Load the persisted signing identity from `path`, generating and saving a
/// fresh one if none exists yet. The identity is stored as JSON; it is not
/// itself a secrets store, matching the teacher's stance that the transport
/// layer is defense-in-depth rather than the trust boundary — this file's
/// permissions are the only protection for the key on disk.
pub fn load_or_generate(path: &Path) -> Result<Ed25519Signer> {
    if let Ok(bytes) = std::fs::read(path) {
        if let Ok(signer) = serde_json::from_slice(&bytes) {
            return Ok(signer);
        }
    }
    let signer = Ed25519Signer::generate_identity();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec(&signer)?)?;
    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_and_persists_an_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.key");

        let first = load_or_generate(&path).unwrap();
        let second = load_or_generate(&path).unwrap();
        assert_eq!(first.verifying_key_bytes(), second.verifying_key_bytes());
    }
}
