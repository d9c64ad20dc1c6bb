//! Splits a file into chunks, hashing each with BLAKE3 and building the
//! manifest's Merkle root.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use quantarax_crypto::hash::blake3;

use super::manifest::{expected_chunk_count, ChunkDescriptor, FecProfile, Manifest, TransferPolicy};
use crate::{ProtocolError, Result};

/// Default chunk size when the caller does not request one, or requests
/// an invalid (`<= 0`) one: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u32 = 1024 * 1024;

/// Chunking parameters for [`compute_manifest`].
#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    /// Requested chunk size in bytes; `0` is replaced with [`DEFAULT_CHUNK_SIZE`]
    pub chunk_size: u32,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

/// Stream `path` in chunk-sized blocks, hash each with BLAKE3, and build a
/// manifest with the resulting Merkle root. The manifest is left unsigned.
pub fn compute_manifest(path: &Path, options: ChunkOptions) -> Result<Manifest> {
    let chunk_size = if options.chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { options.chunk_size };

    let mut file = std::fs::File::open(path)?;
    let file_size = file.metadata()?.len();
    let chunk_count = expected_chunk_count(file_size, chunk_size as u64);

    let mut chunks = Vec::with_capacity(chunk_count as usize);
    let mut leaf_hashes = Vec::with_capacity(chunk_count as usize);

    for index in 0..chunk_count {
        let expected_len = if index == chunk_count - 1 {
            (file_size - (chunk_count as u64 - 1) * chunk_size as u64) as usize
        } else {
            chunk_size as usize
        };
        let mut chunk_buf = vec![0u8; expected_len];
        file.read_exact(&mut chunk_buf)?;

        let hash = blake3::hash(&chunk_buf);
        leaf_hashes.push(hash);
        chunks.push(ChunkDescriptor {
            index,
            hash: STANDARD.encode(hash),
            length: expected_len as u32,
        });
    }

    let root = quantarax_crypto::hash::merkle::merkle_root(&leaf_hashes);

    let created_at = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".into());

    Ok(Manifest {
        session_id: Uuid::new_v4(),
        file_name,
        file_size,
        chunk_size,
        chunk_count,
        hash_algorithm: "BLAKE3".into(),
        chunks,
        merkle_root: STANDARD.encode(root),
        created_at,
        fec: None::<FecProfile>,
        domain_profile: None,
        policy: TransferPolicy::default(),
        signature: None,
    })
}

/// Seek to chunk `index` and read exactly one chunk of `chunk_size` bytes
/// (or fewer, for the final chunk).
pub fn read_chunk(path: &Path, index: u32, chunk_size: u32, final_len: usize) -> Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(index as u64 * chunk_size as u64))?;
    let mut buf = vec![0u8; final_len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}
