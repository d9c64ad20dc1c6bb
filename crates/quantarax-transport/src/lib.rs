//! QUIC connection substrate for QuantaraX
//!
//! A reliable, authenticated, multiplexed bidirectional byte-stream
//! transport over QUIC: `dial`/`listen` establish connections, and each
//! connection multiplexes independent streams opened with `open_stream`/
//! `accept_stream`.

#![forbid(unsafe_code)]

pub mod error;
pub mod transport;

pub use error::TransportError;
pub use transport::quic::{dial, listen, Conn, Listener, Stream};
pub use transport::relay::{parse_relay_response, RelayAddr, ALPN_RELAY, RELAY_OK};

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
