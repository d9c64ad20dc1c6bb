//! Per-session ephemeral key exchange and session-key derivation (§3).
//!
//! The control stream carries 32 raw bytes of ephemeral X25519 public key in
//! each direction before any [`ControlMessage`](quantarax_protocol::wire::messages::ControlMessage)
//! framing begins. Both peers then derive identical [`SessionKeys`] once the
//! signed manifest has crossed the wire, binding the keys to that exact
//! manifest via the HKDF salt.

use quantarax_crypto::kem::{SharedSecret, X25519KeyPair};
use quantarax_crypto::keys::session::{derive_session_keys, SessionKeys};
use quantarax_protocol::transfer::Manifest;
use quantarax_transport::Stream;

use super::error::{EngineError, Result};

/// Exchange ephemeral X25519 public keys over `stream` and return the raw
/// ECDH shared secret. Must run before the stream is handed to
/// [`super::control::ControlChannel`].
pub async fn exchange_ephemeral_keys(stream: &mut Stream) -> Result<SharedSecret> {
    let local = X25519KeyPair::generate_ephemeral();

    stream.write(&local.public_bytes()).await.map_err(EngineError::Transport)?;

    let mut peer_bytes = [0u8; 32];
    let mut filled = 0;
    while filled < peer_bytes.len() {
        let n = stream
            .read(&mut peer_bytes[filled..])
            .await
            .map_err(EngineError::Transport)?
            .ok_or_else(|| EngineError::Handshake("peer closed stream during key exchange".into()))?;
        if n == 0 {
            return Err(EngineError::Handshake("peer closed stream during key exchange".into()));
        }
        filled += n;
    }

    let peer_public = quantarax_crypto::kem::x25519::X25519PublicKey::from(peer_bytes);
    local.exchange(&peer_public).map_err(|e| EngineError::Handshake(e.to_string()))
}

/// Derive the 32-byte manifest hash used as the HKDF salt: a BLAKE3 hash of
/// the manifest's canonical signing bytes (same bytes the signature covers).
pub fn manifest_hash(manifest: &Manifest) -> Result<[u8; 32]> {
    let bytes = manifest.signing_bytes().map_err(EngineError::Protocol)?;
    Ok(quantarax_crypto::hash::blake3::hash(&bytes))
}

/// Derive this session's symmetric key material from the ECDH shared
/// secret and the manifest both peers agreed on.
pub fn derive_keys(shared: &SharedSecret, manifest: &Manifest) -> Result<SessionKeys> {
    let hash = manifest_hash(manifest)?;
    derive_session_keys(shared, &hash).map_err(EngineError::Crypto)
}
