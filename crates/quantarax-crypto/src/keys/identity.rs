//! Long-term peer identity key pairs

use crate::error::Result;
use crate::sig::Ed25519Signer;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// A peer's long-term identity key pair.
///
/// Used to sign transfer manifests and to authenticate the ephemeral
/// handshake key during session setup; never used directly for bulk
/// encryption.
#[derive(Clone, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
pub struct IdentityKeyPair {
    signer: Ed25519Signer,
    id: [u8; 32],
}

impl IdentityKeyPair {
    /// Generate a new identity keypair.
    pub fn generate() -> Result<Self> {
        let signer = Ed25519Signer::generate_identity();
        let id = crate::hash::blake3::hash(&signer.verifying_key_bytes());

        Ok(Self { signer, id })
    }

    /// The signer for this identity.
    pub fn signer(&self) -> &Ed25519Signer {
        &self.signer
    }

    /// The identity fingerprint: BLAKE3 of the Ed25519 public key.
    pub fn id(&self) -> &[u8; 32] {
        &self.id
    }

    /// The Ed25519 public key bytes, for sharing with a peer.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signer.verifying_key_bytes()
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Into::into)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_derived_from_public_key() {
        let identity = IdentityKeyPair::generate().unwrap();
        let expected = crate::hash::blake3::hash(&identity.public_key_bytes());
        assert_eq!(identity.id(), &expected);
    }

    #[test]
    fn roundtrips_through_bytes() {
        let identity = IdentityKeyPair::generate().unwrap();
        let bytes = identity.to_bytes().unwrap();
        let restored = IdentityKeyPair::from_bytes(&bytes).unwrap();
        assert_eq!(identity.public_key_bytes(), restored.public_key_bytes());
        assert_eq!(identity.id(), restored.id());
    }
}
