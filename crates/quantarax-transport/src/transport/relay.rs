//! Relay addressing (C6 extension).
//!
//! No relay server lives in this crate. `RelayAddr` only documents the
//! wire contract a relay would need to speak so a future implementation, or
//! an external one, can interoperate: a client opens a stream on the
//! `"quic-relay"` ALPN, writes the target as a UTF-8 `host:port` string, and
//! reads back either the ASCII bytes `"OK"` or an ASCII error code. Once
//! `"OK"` is read the stream is spliced transparently to the target and the
//! caller proceeds with the normal `"quantarax-quic"` direct-transfer
//! protocol over it.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::TransportError;
use crate::Result;

/// A relay's control-stream ALPN, distinct from the direct-transfer ALPN.
pub const ALPN_RELAY: &str = "quic-relay";

/// Response byte string a relay writes back on success.
pub const RELAY_OK: &[u8] = b"OK";

/// A relay server address plus the direct peer address it should forward
/// to, as carried by a `--relay host:port` style CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayAddr {
    /// Address of the relay server itself.
    pub relay: SocketAddr,
    /// Address of the peer the relay should connect the caller through to.
    pub target: SocketAddr,
}

impl RelayAddr {
    /// The UTF-8 `host:port` payload written on the relay control stream to
    /// request forwarding to [`Self::target`].
    pub fn target_request(&self) -> String {
        self.target.to_string()
    }
}

impl fmt::Display for RelayAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.relay, self.target)
    }
}

impl FromStr for RelayAddr {
    type Err = TransportError;

    /// Parses `"relay_host:relay_port/target_host:target_port"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (relay_part, target_part) = s
            .split_once('/')
            .ok_or_else(|| TransportError::ConnectFailed(format!("malformed relay address: {s}")))?;

        let relay = relay_part
            .parse()
            .map_err(|_| TransportError::ConnectFailed(format!("invalid relay address: {relay_part}")))?;
        let target = target_part
            .parse()
            .map_err(|_| TransportError::ConnectFailed(format!("invalid target address: {target_part}")))?;

        Ok(Self { relay, target })
    }
}

/// Parse a relay control-stream response. `Ok(())` for the literal `"OK"`,
/// otherwise the response bytes are surfaced as the error reason.
pub fn parse_relay_response(bytes: &[u8]) -> Result<()> {
    if bytes == RELAY_OK {
        Ok(())
    } else {
        Err(TransportError::ConnectFailed(format!(
            "relay refused forwarding: {}",
            String::from_utf8_lossy(bytes)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relay_and_target() {
        let addr: RelayAddr = "203.0.113.1:4433/198.51.100.7:9000".parse().unwrap();
        assert_eq!(addr.relay.to_string(), "203.0.113.1:4433");
        assert_eq!(addr.target.to_string(), "198.51.100.7:9000");
        assert_eq!(addr.target_request(), "198.51.100.7:9000");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!("203.0.113.1:4433".parse::<RelayAddr>().is_err());
    }

    #[test]
    fn rejects_invalid_socket_addr() {
        assert!("not-an-addr/198.51.100.7:9000".parse::<RelayAddr>().is_err());
    }

    #[test]
    fn response_ok_is_accepted() {
        parse_relay_response(b"OK").unwrap();
    }

    #[test]
    fn response_error_code_is_surfaced() {
        let err = parse_relay_response(b"ERR_NO_ROUTE").unwrap_err();
        assert!(matches!(err, TransportError::ConnectFailed(_)));
    }
}
