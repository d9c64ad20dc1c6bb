//! Per-transfer session key derivation

use crate::error::{CryptoError, Result};
use crate::kdf::hkdf;
use crate::kem::SharedSecret;
use zeroize::Zeroize;

/// HKDF info string binding derived key material to this protocol version.
const SESSION_INFO: &[u8] = b"quantarax-v1-session";

/// Combined length of payload_key(32) + control_key(32) + iv_base(12).
const SESSION_KEY_MATERIAL_LEN: usize = 32 + 32 + 12;

/// Symmetric key material for one transfer session.
///
/// Derived once per session from the ECDH shared secret and the manifest
/// hash, then used to seal every chunk and control message for that
/// session's lifetime via per-direction nonce counters.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SessionKeys {
    /// AEAD key for chunk payloads.
    pub payload_key: [u8; 32],
    /// AEAD key for control-channel messages.
    pub control_key: [u8; 32],
    /// Base IV that nonce derivation XORs a counter into.
    pub iv_base: [u8; 12],
}

/// Derive session keys from an ECDH shared secret and the transfer's
/// manifest hash.
///
/// Binding the manifest hash into the HKDF salt ties the derived keys to
/// the exact set of files and chunks being transferred: if either peer's
/// manifest differs, key derivation disagrees and nothing decrypts.
pub fn derive_session_keys(shared_secret: &SharedSecret, manifest_hash: &[u8; 32]) -> Result<SessionKeys> {
    let okm = hkdf::derive(manifest_hash, &shared_secret.0, SESSION_INFO, SESSION_KEY_MATERIAL_LEN)?;

    let mut payload_key = [0u8; 32];
    let mut control_key = [0u8; 32];
    let mut iv_base = [0u8; 12];

    payload_key.copy_from_slice(&okm[0..32]);
    control_key.copy_from_slice(&okm[32..64]);
    iv_base.copy_from_slice(&okm[64..76]);

    if payload_key == [0u8; 32] || control_key == [0u8; 32] {
        return Err(CryptoError::KeyGeneration(
            "HKDF produced all-zero session key material".into(),
        ));
    }

    Ok(SessionKeys {
        payload_key,
        control_key,
        iv_base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kem::X25519KeyPair;

    #[test]
    fn both_peers_derive_identical_keys() {
        let alice = X25519KeyPair::generate();
        let bob = X25519KeyPair::generate();
        let manifest_hash = [42u8; 32];

        let alice_shared = alice.exchange(bob.public_key()).unwrap();
        let bob_shared = bob.exchange(alice.public_key()).unwrap();

        let alice_keys = derive_session_keys(&alice_shared, &manifest_hash).unwrap();
        let bob_keys = derive_session_keys(&bob_shared, &manifest_hash).unwrap();

        assert_eq!(alice_keys.payload_key, bob_keys.payload_key);
        assert_eq!(alice_keys.control_key, bob_keys.control_key);
        assert_eq!(alice_keys.iv_base, bob_keys.iv_base);
    }

    #[test]
    fn different_manifest_hash_changes_keys() {
        let alice = X25519KeyPair::generate();
        let bob = X25519KeyPair::generate();
        let shared = alice.exchange(bob.public_key()).unwrap();

        let keys1 = derive_session_keys(&shared, &[1u8; 32]).unwrap();
        let keys2 = derive_session_keys(&shared, &[2u8; 32]).unwrap();

        assert_ne!(keys1.payload_key, keys2.payload_key);
    }

    #[test]
    fn payload_and_control_keys_differ() {
        let alice = X25519KeyPair::generate();
        let bob = X25519KeyPair::generate();
        let shared = alice.exchange(bob.public_key()).unwrap();

        let keys = derive_session_keys(&shared, &[0u8; 32]).unwrap();
        assert_ne!(keys.payload_key, keys.control_key);
    }
}
