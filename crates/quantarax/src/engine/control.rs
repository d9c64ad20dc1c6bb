//! Control-channel framing over a [`quantarax_transport::Stream`] (C7).
//!
//! `Stream` exposes `read`/`write`, not `AsyncRead`/`AsyncWrite`, so it
//! can't be wrapped in `tokio_util::codec::Framed` directly. `ControlChannel`
//! drives [`ControlCodec`] by hand against a growable read buffer instead.

use std::time::Duration;

use bytes::BytesMut;
use quantarax_protocol::wire::codec::ControlCodec;
use quantarax_protocol::wire::messages::ControlMessage;
use quantarax_protocol::ProtocolError;
use quantarax_transport::Stream;
use tokio_util::codec::{Decoder, Encoder};

use super::error::{EngineError, Result};

const READ_CHUNK: usize = 16 * 1024;

/// Framed request/response channel over the transfer's long-lived control
/// stream.
pub struct ControlChannel {
    stream: Stream,
    codec: ControlCodec,
    read_buf: BytesMut,
}

impl ControlChannel {
    /// Wrap an already-open stream. Callers that need a key-exchange
    /// handshake first should run it on `stream` before constructing this.
    pub fn new(stream: Stream) -> Self {
        Self { stream, codec: ControlCodec::new(), read_buf: BytesMut::new() }
    }

    /// Encode and write one message.
    pub async fn send(&mut self, msg: ControlMessage) -> Result<()> {
        let mut out = BytesMut::new();
        self.codec.encode(msg, &mut out).map_err(EngineError::Protocol)?;
        self.stream.write(&out).await.map_err(EngineError::Transport)
    }

    /// Read and decode the next message, pulling more bytes off the stream
    /// as needed. Returns `Ok(None)` on a clean close between frames.
    pub async fn recv(&mut self) -> Result<Option<ControlMessage>> {
        loop {
            if let Some(msg) = self.codec.decode(&mut self.read_buf).map_err(EngineError::Protocol)? {
                return Ok(Some(msg));
            }

            let mut chunk = vec![0u8; READ_CHUNK];
            match self.stream.read(&mut chunk).await.map_err(EngineError::Transport)? {
                None => {
                    if self.read_buf.is_empty() {
                        return Ok(None);
                    }
                    return Err(EngineError::Protocol(ProtocolError::MalformedFrame(
                        "control stream closed mid-frame".into(),
                    )));
                }
                Some(n) => self.read_buf.extend_from_slice(&chunk[..n]),
            }
        }
    }

    /// Apply a read deadline to the next `recv`/`send`, or clear it with
    /// `None`.
    pub fn set_deadline(&mut self, deadline: Option<Duration>) {
        self.stream.set_deadline(deadline);
    }

    /// Close the underlying stream.
    pub async fn close(&mut self) -> Result<()> {
        self.stream.close().await.map_err(EngineError::Transport)
    }
}
