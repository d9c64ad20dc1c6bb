//! AES-256-GCM AEAD

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};

use crate::error::{CryptoError, Result};

/// Encrypt and authenticate data using AES-256-GCM.
///
/// # Arguments
///
/// * `key` - 32-byte encryption key
/// * `nonce` - 12-byte nonce (must be unique per key)
/// * `plaintext` - Data to encrypt
/// * `aad` - Additional authenticated data (can be empty)
///
/// # Returns
///
/// Ciphertext with the 16-byte authentication tag appended.
pub fn seal(key: &[u8; 32], nonce: &[u8; 12], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(nonce);

    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(nonce, payload)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Decrypt and verify data using AES-256-GCM.
///
/// # Arguments
///
/// * `key` - 32-byte encryption key
/// * `nonce` - 12-byte nonce (must match the one used to seal)
/// * `ciphertext` - Data to decrypt (includes authentication tag)
/// * `aad` - Additional authenticated data (must match the one used to seal)
///
/// # Returns
///
/// Decrypted plaintext if authentication succeeds.
pub fn open(key: &[u8; 32], nonce: &[u8; 12], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(nonce);

    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(nonce, payload)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = [0u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"hello world";
        let aad = b"metadata";

        let ciphertext = seal(&key, &nonce, plaintext, aad).unwrap();
        let decrypted = open(&key, &nonce, &ciphertext, aad).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn wrong_key_fails() {
        let key1 = [0u8; 32];
        let key2 = [1u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"secret";

        let ciphertext = seal(&key1, &nonce, plaintext, &[]).unwrap();
        let result = open(&key2, &nonce, &ciphertext, &[]);

        assert_eq!(result.unwrap_err(), CryptoError::AuthenticationFailed);
    }

    #[test]
    fn wrong_aad_fails() {
        let key = [0u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"secret";

        let ciphertext = seal(&key, &nonce, plaintext, b"metadata1").unwrap();
        let result = open(&key, &nonce, &ciphertext, b"metadata2");

        assert!(result.is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = [0u8; 32];
        let nonce = [1u8; 12];
        let mut ciphertext = seal(&key, &nonce, b"secret", &[]).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        assert!(open(&key, &nonce, &ciphertext, &[]).is_err());
    }
}
