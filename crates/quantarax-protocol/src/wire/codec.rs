//! Framing codec for the control channel
//!
//! Each message is written as `[u8 type][u32 length, big-endian][length bytes
//! of JSON payload]`. `type` is one of the [`MessageKind`] wire values and
//! selects how the JSON payload is deserialized.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::messages::{
    AckMessage, ChunkHaveRequestMessage, ChunkHaveResponseMessage, ControlMessage,
    FecUpdateMessage, ManifestMessage, MessageKind, NackMessage, StatusMessage,
    VerificationMessage,
};
use crate::{ProtocolError, Result};

const HEADER_LEN: usize = 1 + 4;
/// Refuse to allocate for a claimed payload larger than this. Control
/// messages carry manifests, not chunk bodies, so a few MiB is generous.
const MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

/// `tokio_util::codec` framing for [`ControlMessage`].
#[derive(Debug, Default)]
pub struct ControlCodec {
    /// Length of the payload currently being awaited, once the header has
    /// been parsed out of the buffer. `None` for the kind means the type
    /// byte was unrecognized; the payload is still read off the wire (to
    /// keep the stream in sync) and then discarded.
    awaiting: Option<(Option<MessageKind>, u32)>,
}

impl ControlCodec {
    /// Create a fresh codec with no partially-read frame in progress.
    pub fn new() -> Self {
        Self { awaiting: None }
    }
}

impl Encoder<ControlMessage> for ControlCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: ControlMessage, buf: &mut BytesMut) -> Result<()> {
        let type_byte = msg.kind() as u8;
        let payload = serde_json::to_vec(&msg)?;
        if payload.len() > MAX_PAYLOAD_LEN as usize {
            return Err(ProtocolError::MalformedFrame(format!(
                "control payload of {} bytes exceeds max {MAX_PAYLOAD_LEN}",
                payload.len()
            )));
        }

        buf.reserve(HEADER_LEN + payload.len());
        buf.put_u8(type_byte);
        buf.put_u32(payload.len() as u32);
        buf.put_slice(&payload);
        Ok(())
    }
}

impl Decoder for ControlCodec {
    type Item = ControlMessage;
    type Error = ProtocolError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ControlMessage>> {
        // Loop rather than recurse: an unknown type byte is consumed and
        // skipped in place, then the next frame in the buffer is tried.
        loop {
            let (kind, len) = match self.awaiting {
                Some(header) => header,
                None => {
                    if buf.len() < HEADER_LEN {
                        buf.reserve(HEADER_LEN - buf.len());
                        return Ok(None);
                    }
                    let type_byte = buf[0];
                    let len = u32::from_be_bytes(buf[1..5].try_into().unwrap());
                    if len > MAX_PAYLOAD_LEN {
                        return Err(ProtocolError::MalformedFrame(format!(
                            "claimed payload of {len} bytes exceeds max {MAX_PAYLOAD_LEN}"
                        )));
                    }
                    // Unknown types are ignored after the length is known,
                    // not rejected: forward compatibility per the wire
                    // contract (new message kinds must stay decodable by
                    // older peers).
                    let kind = MessageKind::from_u8(type_byte);
                    buf.advance(HEADER_LEN);
                    self.awaiting = Some((kind, len));
                    (kind, len)
                }
            };

            let len = len as usize;
            if buf.len() < len {
                buf.reserve(len - buf.len());
                return Ok(None);
            }

            let payload = buf.split_to(len);
            self.awaiting = None;

            let Some(kind) = kind else { continue };
            let msg = decode_payload(kind, &payload)?;
            return Ok(Some(msg));
        }
    }
}

fn decode_payload(kind: MessageKind, payload: &[u8]) -> Result<ControlMessage> {
    Ok(match kind {
        MessageKind::Manifest => ControlMessage::Manifest(serde_json::from_slice::<ManifestMessage>(payload)?),
        MessageKind::Ack => ControlMessage::Ack(serde_json::from_slice::<AckMessage>(payload)?),
        MessageKind::Nack => ControlMessage::Nack(serde_json::from_slice::<NackMessage>(payload)?),
        MessageKind::Status => ControlMessage::Status(serde_json::from_slice::<StatusMessage>(payload)?),
        MessageKind::Verification => {
            ControlMessage::Verification(serde_json::from_slice::<VerificationMessage>(payload)?)
        }
        MessageKind::FecUpdate => ControlMessage::FecUpdate(serde_json::from_slice::<FecUpdateMessage>(payload)?),
        MessageKind::ChunkHaveRequest => {
            ControlMessage::ChunkHaveRequest(serde_json::from_slice::<ChunkHaveRequestMessage>(payload)?)
        }
        MessageKind::ChunkHaveResponse => {
            ControlMessage::ChunkHaveResponse(serde_json::from_slice::<ChunkHaveResponseMessage>(payload)?)
        }
    })
}
