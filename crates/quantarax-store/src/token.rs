//! Transfer token minting and parsing (C13).
//!
//! `quantarax://xfer?t=<base64url(json{session_id, manifest, created_at})>`

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use quantarax_protocol::transfer::Manifest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, StoreError};

const SCHEME_PREFIX: &str = "quantarax://xfer?t=";

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    session_id: Uuid,
    manifest: Manifest,
    created_at: u64,
}

/// A parsed transfer token.
pub struct TransferToken {
    pub session_id: Uuid,
    pub manifest: Manifest,
    pub created_at: u64,
}

/// Mint a transfer token URI for `session_id`/`manifest`, stamped at
/// `created_at` (unix seconds).
pub fn mint(session_id: Uuid, manifest: &Manifest, created_at: u64) -> Result<String> {
    let payload = TokenPayload { session_id, manifest: manifest.clone(), created_at };
    let json = serde_json::to_vec(&payload)?;
    Ok(format!("{SCHEME_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
}

/// Parse a transfer token URI, failing with [`StoreError::InvalidToken`] on
/// any structural mismatch.
pub fn parse(token: &str) -> Result<TransferToken> {
    let encoded = token
        .strip_prefix(SCHEME_PREFIX)
        .ok_or_else(|| StoreError::InvalidToken("missing quantarax://xfer?t= prefix".into()))?;

    let json = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| StoreError::InvalidToken(format!("invalid base64url: {e}")))?;

    let payload: TokenPayload =
        serde_json::from_slice(&json).map_err(|e| StoreError::InvalidToken(format!("invalid payload: {e}")))?;

    Ok(TransferToken { session_id: payload.session_id, manifest: payload.manifest, created_at: payload.created_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantarax_protocol::transfer::{compute_manifest, ChunkOptions};
    use std::io::Write;

    fn sample_manifest() -> Manifest {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        compute_manifest(file.path(), ChunkOptions::default()).unwrap()
    }

    #[test]
    fn mint_then_parse_roundtrips() {
        let manifest = sample_manifest();
        let session_id = manifest.session_id;
        let token = mint(session_id, &manifest, 1_700_000_000).unwrap();
        assert!(token.starts_with(SCHEME_PREFIX));

        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.session_id, session_id);
        assert_eq!(parsed.created_at, 1_700_000_000);
        assert_eq!(parsed.manifest.merkle_root, manifest.merkle_root);
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!(matches!(parse("not-a-token"), Err(StoreError::InvalidToken(_))));
    }

    #[test]
    fn parse_rejects_invalid_base64() {
        let bad = format!("{SCHEME_PREFIX}not valid base64!!");
        assert!(matches!(parse(&bad), Err(StoreError::InvalidToken(_))));
    }

    #[test]
    fn parse_rejects_malformed_payload() {
        let encoded = URL_SAFE_NO_PAD.encode(b"{\"not\":\"a token\"}");
        let bad = format!("{SCHEME_PREFIX}{encoded}");
        assert!(matches!(parse(&bad), Err(StoreError::InvalidToken(_))));
    }
}
