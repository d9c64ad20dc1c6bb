//! Protocol version negotiation

use crate::{ProtocolError, Result};

/// Current control-protocol and chunk-frame version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Minimum version this build still understands.
const MIN_PROTOCOL_VERSION: u8 = 1;

/// Validate a peer-advertised protocol version against what this build
/// supports, returning the version both sides agree to use.
pub fn negotiate_version(local: u8, remote: u8) -> Result<u8> {
    if remote < MIN_PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedProtocolVersion(remote));
    }
    Ok(local.min(remote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_version_negotiates_to_itself() {
        assert_eq!(negotiate_version(1, 1).unwrap(), 1);
    }

    #[test]
    fn rejects_version_below_minimum() {
        assert!(negotiate_version(1, 0).is_err());
    }
}
