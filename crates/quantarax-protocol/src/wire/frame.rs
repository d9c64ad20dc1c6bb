//! Per-chunk wire frame
//!
//! Each chunk is written once on a fresh transport stream: a fixed 32-byte
//! header followed by the AEAD ciphertext (plaintext || 16-byte tag).

use crate::{ProtocolError, Result};

/// Chunk frame magic number: ASCII "QNTX" read as a big-endian u32.
pub const MAGIC: u32 = 0x514E_5458;

/// Wire format version this build writes and accepts.
pub const VERSION: u8 = 1;

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 32;

/// A decoded chunk frame header (the ciphertext is read separately once
/// `payload_length` is known).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkFrameHeader {
    /// Session this chunk belongs to
    pub session_id: [u8; 16],
    /// Index of this chunk within the manifest
    pub chunk_index: u32,
    /// Length of the ciphertext (including the 16-byte AEAD tag) that follows
    pub payload_length: u32,
}

impl ChunkFrameHeader {
    /// Encode the fixed 32-byte header.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC.to_be_bytes());
        buf[4] = VERSION;
        // bytes 5..8 are reserved, left zero
        buf[8..24].copy_from_slice(&self.session_id);
        buf[24..28].copy_from_slice(&self.chunk_index.to_be_bytes());
        buf[28..32].copy_from_slice(&self.payload_length.to_be_bytes());
        buf
    }

    /// Decode a 32-byte header, validating magic and version.
    ///
    /// Does not check `session_id` against an expected session; callers
    /// that are mid-session should compare it themselves and raise
    /// [`ProtocolError::SessionIdMismatch`].
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self> {
        let magic = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        let version = buf[4];
        if version != VERSION {
            return Err(ProtocolError::UnsupportedProtocolVersion(version));
        }

        let mut session_id = [0u8; 16];
        session_id.copy_from_slice(&buf[8..24]);
        let chunk_index = u32::from_be_bytes(buf[24..28].try_into().unwrap());
        let payload_length = u32::from_be_bytes(buf[28..32].try_into().unwrap());

        Ok(Self {
            session_id,
            chunk_index,
            payload_length,
        })
    }
}

/// A full chunk frame: header plus ciphertext.
#[derive(Debug, Clone)]
pub struct ChunkFrame {
    /// Session this chunk belongs to
    pub session_id: [u8; 16],
    /// Index of this chunk within the manifest
    pub chunk_index: u32,
    /// AEAD ciphertext, including the 16-byte tag
    pub ciphertext: Vec<u8>,
}

impl ChunkFrame {
    /// Build a frame from its parts.
    pub fn new(session_id: [u8; 16], chunk_index: u32, ciphertext: Vec<u8>) -> Self {
        Self {
            session_id,
            chunk_index,
            ciphertext,
        }
    }

    /// The additional authenticated data bound to this chunk: the session
    /// id followed by the chunk index as an 8-byte big-endian integer.
    pub fn aad(session_id: &[u8; 16], chunk_index: u32) -> [u8; 24] {
        let mut aad = [0u8; 24];
        aad[..16].copy_from_slice(session_id);
        aad[16..24].copy_from_slice(&(chunk_index as u64).to_be_bytes());
        aad
    }

    /// Serialize the full frame: header followed by ciphertext.
    pub fn encode(&self) -> Vec<u8> {
        let header = ChunkFrameHeader {
            session_id: self.session_id,
            chunk_index: self.chunk_index,
            payload_length: self.ciphertext.len() as u32,
        };
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(&self.ciphertext);
        buf
    }

    /// Decode a full frame from exactly `HEADER_LEN + payload_length` bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ProtocolError::MalformedFrame("frame shorter than header".into()));
        }
        let mut header_bytes = [0u8; HEADER_LEN];
        header_bytes.copy_from_slice(&buf[..HEADER_LEN]);
        let header = ChunkFrameHeader::decode(&header_bytes)?;

        let expected_len = HEADER_LEN + header.payload_length as usize;
        if buf.len() != expected_len {
            return Err(ProtocolError::MalformedFrame(format!(
                "expected {} total bytes, got {}",
                expected_len,
                buf.len()
            )));
        }

        Ok(Self {
            session_id: header.session_id,
            chunk_index: header.chunk_index,
            ciphertext: buf[HEADER_LEN..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = ChunkFrameHeader {
            session_id: [7u8; 16],
            chunk_index: 42,
            payload_length: 1024,
        };
        let encoded = header.encode();
        let decoded = ChunkFrameHeader::decode(&encoded).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = [0u8; HEADER_LEN];
        buf[4] = VERSION;
        assert!(matches!(ChunkFrameHeader::decode(&buf), Err(ProtocolError::InvalidMagic)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC.to_be_bytes());
        buf[4] = 99;
        assert!(matches!(
            ChunkFrameHeader::decode(&buf),
            Err(ProtocolError::UnsupportedProtocolVersion(99))
        ));
    }

    #[test]
    fn full_frame_roundtrip() {
        let frame = ChunkFrame::new([9u8; 16], 3, vec![1, 2, 3, 4, 5]);
        let encoded = frame.encode();
        let decoded = ChunkFrame::decode(&encoded).unwrap();
        assert_eq!(decoded.session_id, frame.session_id);
        assert_eq!(decoded.chunk_index, frame.chunk_index);
        assert_eq!(decoded.ciphertext, frame.ciphertext);
    }

    #[test]
    fn empty_ciphertext_is_a_valid_minimum_frame() {
        // AEAD of zero-length plaintext still produces a 16-byte tag.
        let frame = ChunkFrame::new([0u8; 16], 0, vec![0u8; 16]);
        let encoded = frame.encode();
        assert_eq!(encoded.len(), HEADER_LEN + 16);
        let decoded = ChunkFrame::decode(&encoded).unwrap();
        assert_eq!(decoded.ciphertext.len(), 16);
    }

    #[test]
    fn aad_binds_session_and_index() {
        let session_id = [5u8; 16];
        let aad1 = ChunkFrame::aad(&session_id, 1);
        let aad2 = ChunkFrame::aad(&session_id, 2);
        assert_ne!(aad1, aad2);
        assert_eq!(&aad1[..16], &session_id);
    }
}
