//! Control-channel message types

use serde::{Deserialize, Serialize};

/// Wire type byte for each control message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// Signed manifest handshake
    Manifest = 1,
    /// Positive acknowledgment of received chunk ranges
    Ack = 2,
    /// Negative acknowledgment requesting retransmission
    Nack = 3,
    /// Free-form session/progress status update
    Status = 4,
    /// Final signed verification of the completed transfer
    Verification = 5,
    /// Sender-initiated FEC parameter change
    FecUpdate = 6,
    /// Sender asks which manifest indices the receiver already has
    ChunkHaveRequest = 7,
    /// Receiver's answer to a have-request
    ChunkHaveResponse = 8,
}

impl MessageKind {
    /// Map a wire type byte back to a [`MessageKind`], if recognized.
    ///
    /// Per §4.7, unknown types (after the version check) are ignored rather
    /// than treated as fatal, so this returns `Option` and callers skip
    /// frames that don't resolve to a known kind.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Manifest),
            2 => Some(Self::Ack),
            3 => Some(Self::Nack),
            4 => Some(Self::Status),
            5 => Some(Self::Verification),
            6 => Some(Self::FecUpdate),
            7 => Some(Self::ChunkHaveRequest),
            8 => Some(Self::ChunkHaveResponse),
            _ => None,
        }
    }
}

/// `MANIFEST`: sender → receiver, the signed manifest handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMessage {
    /// Canonical bytes of the manifest that were signed
    pub manifest_json_bytes: Vec<u8>,
    /// Signature over `manifest_json_bytes`
    pub signature: Vec<u8>,
    /// Sender's Ed25519 public key
    pub public_key: [u8; 32],
    /// Protocol version the sender speaks
    pub protocol_version: u8,
}

/// `ACK`: receiver → sender, a compressed range of successfully received
/// and persisted chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    /// Compressed range string, e.g. `"0-2,4-6,8,10-11"`
    pub chunk_ranges: String,
    /// Total number of chunks received so far
    pub total_received: u32,
    /// Unix seconds
    pub timestamp: u64,
    /// Session this ACK applies to
    pub session_id: String,
}

/// `NACK`: receiver → sender, a compressed range of chunks to retransmit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NackMessage {
    /// Compressed range string of missing/failed chunk indices
    pub missing_ranges: String,
    /// Short machine-readable reason, e.g. `"decrypt_failed"`, `"hash_mismatch"`
    pub reason: String,
    /// Session this NACK applies to
    pub session_id: String,
    /// Unix seconds
    pub timestamp: u64,
}

/// `STATUS`: either direction, a free-form progress/state update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Session state name
    pub state: String,
    /// 0-100
    pub progress_percent: f64,
    /// Human-readable note
    pub message: String,
    /// Unix seconds
    pub timestamp: u64,
}

/// Outcome reported in a [`VerificationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// The recomputed Merkle root matched the manifest
    Success,
    /// The recomputed Merkle root did not match
    HashMismatch,
    /// Corruption was detected that was not a simple root mismatch
    CorruptionDetected,
}

/// `VERIFICATION`: receiver → sender, the final signed Merkle-root check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationMessage {
    /// Session this verification applies to
    pub session_id: String,
    /// Outcome of the check
    pub status: VerificationStatus,
    /// Base64 Merkle root computed from the received file on disk
    pub merkle_computed: String,
    /// Base64 Merkle root from the manifest
    pub merkle_expected: String,
    /// Unix seconds
    pub timestamp: u64,
    /// Signature over the canonical JSON of
    /// `{session_id, status, merkle_computed, merkle_expected, timestamp}`
    pub signature: Vec<u8>,
    /// Receiver's Ed25519 public key
    pub public_key: [u8; 32],
}

/// `FEC_UPDATE`: sender → receiver, a change in Reed-Solomon parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FecUpdateMessage {
    /// Session this update applies to
    pub session_id: String,
    /// New data-shard count
    pub k: usize,
    /// New parity-shard count
    pub r: usize,
    /// Short machine-readable reason, e.g. `"loss>10%"`
    pub reason: String,
    /// Unix seconds
    pub timestamp: u64,
}

/// `CHUNK_HAVE_REQUEST`: sender → receiver, asking what's already present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkHaveRequestMessage {
    /// Session this request applies to
    pub session_id: String,
    /// Total chunk count from the manifest
    pub chunk_count: u32,
}

/// `CHUNK_HAVE_RESPONSE`: receiver → sender, a compressed range of indices
/// whose hash is already present in the content-addressed store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkHaveResponseMessage {
    /// Session this response applies to
    pub session_id: String,
    /// Compressed range string of already-present indices
    pub have_ranges: String,
    /// Total chunk count from the manifest
    pub chunk_count: u32,
    /// Unix seconds
    pub timestamp: u64,
}

/// A decoded control message, tagged by its wire type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ControlMessage {
    /// See [`ManifestMessage`]
    Manifest(ManifestMessage),
    /// See [`AckMessage`]
    Ack(AckMessage),
    /// See [`NackMessage`]
    Nack(NackMessage),
    /// See [`StatusMessage`]
    Status(StatusMessage),
    /// See [`VerificationMessage`]
    Verification(VerificationMessage),
    /// See [`FecUpdateMessage`]
    FecUpdate(FecUpdateMessage),
    /// See [`ChunkHaveRequestMessage`]
    ChunkHaveRequest(ChunkHaveRequestMessage),
    /// See [`ChunkHaveResponseMessage`]
    ChunkHaveResponse(ChunkHaveResponseMessage),
}

impl ControlMessage {
    /// The wire type byte for this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Manifest(_) => MessageKind::Manifest,
            Self::Ack(_) => MessageKind::Ack,
            Self::Nack(_) => MessageKind::Nack,
            Self::Status(_) => MessageKind::Status,
            Self::Verification(_) => MessageKind::Verification,
            Self::FecUpdate(_) => MessageKind::FecUpdate,
            Self::ChunkHaveRequest(_) => MessageKind::ChunkHaveRequest,
            Self::ChunkHaveResponse(_) => MessageKind::ChunkHaveResponse,
        }
    }
}
