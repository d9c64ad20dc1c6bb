//! Receiver engine (C10).
//!
//! Accepts the control stream and one stream per chunk on an inbound
//! [`Conn`]. Each chunk stream is handled in its own task (decrypt, verify,
//! persist); the main task owns the control channel and the session/CAS
//! stores, draining a channel of per-chunk outcomes to emit batched ACKs
//! and NACKs. Chunks travel one-per-reliable-stream, so loss first surfaces
//! as a failed/closed stream; [`FecGroups`] gives the receiver a second
//! path to recovery that doesn't wait on a NACK round trip: data and parity
//! shards of the same FEC group are pooled as they arrive, and a group is
//! reconstructed as soon as enough of its `k + r` shards are in hand.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine};
use quantarax_crypto::hash::blake3;
use quantarax_crypto::sig::Ed25519Signer;
use quantarax_crypto::symmetric::{aes_gcm, nonce::NonceSequence};
use quantarax_protocol::domain;
use quantarax_protocol::fec::{FecCodec, FecParams};
use quantarax_protocol::transfer::{Manifest, ResumeBitmap};
use quantarax_protocol::wire::messages::{
    AckMessage, ChunkHaveResponseMessage, ControlMessage, NackMessage, VerificationMessage,
    VerificationStatus,
};
use quantarax_protocol::wire::frame::ChunkFrameHeader;
use quantarax_protocol::wire::{compress_ranges, ChunkFrame};
use quantarax_store::cas::ContentStore;
use quantarax_store::session::SessionStore;
use quantarax_transport::Conn;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::control::ControlChannel;
use super::error::{EngineError, Result};
use super::handshake;

fn unix_now() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Result of a receiver session.
pub struct ReceiveOutcome {
    pub session_id: Uuid,
    pub output_path: PathBuf,
    pub verified: bool,
}

/// Whether a decoded chunk stream carried file data or FEC parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    Data,
    Parity,
}

enum ChunkOutcome {
    Ok { index: u32, kind: ChunkKind, plaintext: Vec<u8> },
    Bad { index: u32, reason: &'static str },
}

struct FecGroupState {
    k: usize,
    r: usize,
    shards: Vec<Option<Vec<u8>>>,
    recovered: Vec<bool>,
}

/// Pools FEC shards per group as they arrive and reconstructs a group the
/// moment it holds at least `k` of its `k + r` shards. Fixed `(k, r)` for
/// the whole transfer, taken from the manifest/domain profile, matching the
/// sender's static group layout (`FEC_UPDATE` only retunes bookkeeping, not
/// the shard layout already in flight).
struct FecGroups {
    k: usize,
    r: usize,
    chunk_count: u32,
    num_groups: u32,
    groups: HashMap<u32, FecGroupState>,
}

impl FecGroups {
    fn new(k: usize, r: usize, chunk_count: u32) -> Self {
        let num_groups = if k == 0 { 0 } else { (chunk_count as usize).div_ceil(k) as u32 };
        Self { k, r, chunk_count, num_groups, groups: HashMap::new() }
    }

    fn group_len(&self, group_id: u32) -> usize {
        let start = group_id as u64 * self.k as u64;
        (self.chunk_count as u64).saturating_sub(start).min(self.k as u64) as usize
    }

    fn locate(&self, chunk_index: u32, kind: ChunkKind) -> Option<(u32, usize)> {
        match kind {
            ChunkKind::Data => {
                if chunk_index >= self.chunk_count || self.k == 0 {
                    return None;
                }
                let group_id = chunk_index / self.k as u32;
                let slot = (chunk_index % self.k as u32) as usize;
                Some((group_id, slot))
            }
            ChunkKind::Parity => {
                if self.r == 0 {
                    return None;
                }
                let parity_index = chunk_index.checked_sub(self.chunk_count)?;
                let group_id = parity_index / self.r as u32;
                if group_id >= self.num_groups {
                    return None;
                }
                let slot = self.k + (parity_index % self.r as u32) as usize;
                Some((group_id, slot))
            }
        }
    }

    /// Record a successfully decrypted shard, padded/truncated to
    /// `shard_len`, and attempt to reconstruct its group. Returns freshly
    /// recovered `(chunk_index, padded_plaintext)` pairs for data shards
    /// that hadn't already been seen directly or recovered before.
    fn record_and_reconstruct(
        &mut self,
        chunk_index: u32,
        kind: ChunkKind,
        mut plaintext: Vec<u8>,
        shard_len: usize,
    ) -> Vec<(u32, Vec<u8>)> {
        let Some((group_id, slot)) = self.locate(chunk_index, kind) else {
            return Vec::new();
        };
        let group_len = self.group_len(group_id);
        if group_len == 0 {
            return Vec::new();
        }
        let r = self.r;
        let group = self.groups.entry(group_id).or_insert_with(|| FecGroupState {
            k: group_len,
            r,
            shards: vec![None; group_len + r],
            recovered: vec![false; group_len],
        });

        plaintext.resize(shard_len, 0);
        group.shards[slot] = Some(plaintext);

        let missing = group.shards.iter().filter(|s| s.is_none()).count();
        if missing == 0 || missing > group.r {
            return Vec::new();
        }

        let Ok(codec) = FecCodec::new(FecParams { k: group.k, r: group.r }) else {
            return Vec::new();
        };
        let mut attempt = group.shards.clone();
        if codec.reconstruct(&mut attempt).is_err() {
            return Vec::new();
        }

        let mut recovered = Vec::new();
        for i in 0..group.k {
            if group.recovered[i] {
                continue;
            }
            group.recovered[i] = true;
            if group.shards[i].is_none() {
                if let Some(bytes) = attempt[i].take() {
                    recovered.push((group_id * self.k as u32 + i as u32, bytes));
                }
            }
        }
        recovered
    }
}

/// Accept one inbound transfer on `conn`, writing the result under
/// `download_dir`. `cas` is consulted for chunk-have preflight and fed as
/// chunks are verified.
pub async fn receive_file(
    conn: Arc<Conn>,
    download_dir: &Path,
    cas: Arc<dyn ContentStore>,
    identity: &Ed25519Signer,
    sessions: Arc<SessionStore>,
) -> Result<ReceiveOutcome> {
    let mut control_stream = conn.accept_stream().await.map_err(EngineError::Transport)?;
    let shared = handshake::exchange_ephemeral_keys(&mut control_stream).await?;
    let mut control = ControlChannel::new(control_stream);

    let manifest_msg = match control.recv().await? {
        Some(ControlMessage::Manifest(m)) => m,
        _ => return Err(EngineError::Handshake("expected MANIFEST as first control message".into())),
    };

    let manifest: Manifest = serde_json::from_slice(&manifest_msg.manifest_json_bytes)
        .map_err(|e| EngineError::Handshake(format!("malformed manifest: {e}")))?;
    let mut signed = manifest.clone();
    signed.signature = Some(manifest_msg.signature.clone());
    signed.verify(&manifest_msg.public_key).map_err(|_| EngineError::ManifestNotTrusted)?;
    signed.validate().map_err(EngineError::Protocol)?;

    let profile = signed
        .domain_profile
        .as_deref()
        .map(domain::by_name)
        .transpose()
        .map_err(EngineError::Protocol)?
        .unwrap_or(domain::MEDIA);
    domain::accept_transfer(&signed, &profile).map_err(EngineError::Protocol)?;

    let keys = handshake::derive_keys(&shared, &signed)?;
    let session_id = signed.session_id;
    let session_id_str = session_id.to_string();

    let output_path = download_dir.join(&signed.file_name);
    let file = OpenOptions::new().create(true).write(true).read(true).open(&output_path)?;
    file.set_len(signed.file_size)?;
    let file = Arc::new(StdMutex::new(file));

    let mut bitmap = sessions.load_bitmap(session_id, signed.chunk_count)?;
    let (fec_k, fec_r) = signed.fec.as_ref().map(|f| (f.k, f.r)).unwrap_or((profile.fec.k, profile.fec.r));
    let mut fec_groups = FecGroups::new(fec_k, fec_r, signed.chunk_count);

    if let Some(ControlMessage::ChunkHaveRequest(_)) = peek_have_request(&mut control).await? {
        let have: Vec<u32> = signed
            .chunks
            .iter()
            .filter_map(|d| {
                let hash = decode_hash(&d.hash).ok()?;
                if cas.has(&hash).unwrap_or(false) {
                    Some(d.index)
                } else {
                    None
                }
            })
            .collect();
        for idx in &have {
            let _ = bitmap.set(*idx);
        }
        control
            .send(ControlMessage::ChunkHaveResponse(ChunkHaveResponseMessage {
                session_id: session_id_str.clone(),
                have_ranges: compress_ranges(&have),
                chunk_count: signed.chunk_count,
                timestamp: unix_now(),
            }))
            .await?;
    }

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<ChunkOutcome>();
    let nonces = Arc::new(NonceSequence::new(keys.iv_base, false));
    let manifest = Arc::new(signed);
    let payload_key = keys.payload_key;

    let mut last_fec_update = Instant::now() - Duration::from_secs(1);
    let received_total = Arc::new(AtomicU64::new(bitmap.received_count() as u64));

    loop {
        if bitmap.is_complete() {
            break;
        }
        tokio::select! {
            stream = conn.accept_stream() => {
                let stream = stream.map_err(EngineError::Transport)?;
                spawn_chunk_handler(
                    stream,
                    manifest.clone(),
                    payload_key,
                    nonces.clone(),
                    file.clone(),
                    cas.clone(),
                    received_total.clone(),
                    outcome_tx.clone(),
                );
            }
            msg = control.recv() => {
                match msg? {
                    Some(ControlMessage::FecUpdate(update)) => {
                        let now = Instant::now();
                        let boundary = update.k > 0 && received_total.load(Ordering::Relaxed) as usize % update.k == 0;
                        if boundary && now.duration_since(last_fec_update) >= Duration::from_millis(500) {
                            last_fec_update = now;
                        }
                    }
                    _ => {}
                }
            }
            outcome = outcome_rx.recv() => {
                match outcome {
                    Some(ChunkOutcome::Ok { index, kind, plaintext }) => {
                        if kind == ChunkKind::Data {
                            let _ = bitmap.set(index);
                            let _ = sessions.set_chunk(session_id, index, manifest.chunk_count, unix_now());
                            control.send(ControlMessage::Ack(AckMessage {
                                chunk_ranges: compress_ranges(&[index]),
                                total_received: bitmap.received_count(),
                                timestamp: unix_now(),
                                session_id: session_id_str.clone(),
                            })).await?;
                        }

                        let recovered = fec_groups.record_and_reconstruct(
                            index, kind, plaintext, manifest.chunk_size as usize,
                        );
                        for (r_index, mut r_plaintext) in recovered {
                            if bitmap.has(r_index) {
                                continue;
                            }
                            let Some(descriptor) = manifest.chunks.get(r_index as usize) else { continue };
                            r_plaintext.truncate(descriptor.length as usize);
                            let digest = blake3::hash(&r_plaintext);
                            let Ok(expected) = decode_hash(&descriptor.hash) else { continue };
                            if digest != expected || write_chunk_to_disk(&file, &manifest, r_index, &r_plaintext).is_err() {
                                control.send(ControlMessage::Nack(NackMessage {
                                    missing_ranges: compress_ranges(&[r_index]),
                                    reason: "fec_reconstruct_mismatch".into(),
                                    session_id: session_id_str.clone(),
                                    timestamp: unix_now(),
                                })).await?;
                                continue;
                            }
                            let _ = cas.put(&expected, unix_now());
                            let _ = bitmap.set(r_index);
                            let _ = sessions.set_chunk(session_id, r_index, manifest.chunk_count, unix_now());
                            received_total.fetch_add(1, Ordering::Relaxed);
                            control.send(ControlMessage::Ack(AckMessage {
                                chunk_ranges: compress_ranges(&[r_index]),
                                total_received: bitmap.received_count(),
                                timestamp: unix_now(),
                                session_id: session_id_str.clone(),
                            })).await?;
                        }
                    }
                    Some(ChunkOutcome::Bad { index, reason }) => {
                        control.send(ControlMessage::Nack(NackMessage {
                            missing_ranges: compress_ranges(&[index]),
                            reason: reason.to_string(),
                            session_id: session_id_str.clone(),
                            timestamp: unix_now(),
                        })).await?;
                    }
                    None => {}
                }
            }
        }
    }

    let verification = finalize(&manifest, &file, identity, &session_id_str)?;
    let verified = matches!(verification.status, VerificationStatus::Success);
    control.send(ControlMessage::Verification(verification)).await?;
    control.close().await?;

    Ok(ReceiveOutcome { session_id, output_path, verified })
}

async fn peek_have_request(control: &mut ControlChannel) -> Result<Option<ControlMessage>> {
    control.set_deadline(Some(Duration::from_millis(500)));
    let msg = control.recv().await;
    control.set_deadline(None);
    match msg {
        Ok(m) => Ok(m),
        Err(EngineError::Transport(quantarax_transport::TransportError::TimedOut)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn decode_hash(b64: &str) -> Result<[u8; 32]> {
    let bytes = STANDARD.decode(b64).map_err(|_| EngineError::Handshake("bad chunk hash encoding".into()))?;
    bytes.try_into().map_err(|_| EngineError::Handshake("chunk hash is not 32 bytes".into()))
}

#[allow(clippy::too_many_arguments)]
fn spawn_chunk_handler(
    mut stream: quantarax_transport::Stream,
    manifest: Arc<Manifest>,
    payload_key: [u8; 32],
    nonces: Arc<NonceSequence>,
    file: Arc<StdMutex<std::fs::File>>,
    cas: Arc<dyn ContentStore>,
    received_total: Arc<AtomicU64>,
    outcome_tx: mpsc::UnboundedSender<ChunkOutcome>,
) {
    tokio::spawn(async move {
        let outcome = process_one_chunk(&mut stream, &manifest, &payload_key, &nonces, &file, &cas).await;
        match outcome {
            Ok((index, kind, plaintext)) => {
                received_total.fetch_add(1, Ordering::Relaxed);
                let _ = outcome_tx.send(ChunkOutcome::Ok { index, kind, plaintext });
            }
            Err((index, reason)) => {
                let _ = outcome_tx.send(ChunkOutcome::Bad { index, reason });
            }
        }
    });
}

fn write_chunk_to_disk(
    file: &StdMutex<std::fs::File>,
    manifest: &Manifest,
    index: u32,
    plaintext: &[u8],
) -> std::io::Result<()> {
    let mut f = file.lock().unwrap();
    f.seek(SeekFrom::Start(index as u64 * manifest.chunk_size as u64))?;
    f.write_all(plaintext)
}

/// Decrypt one chunk stream. Indices below `manifest.chunk_count` are data
/// chunks, verified against the manifest's hash and written to disk;
/// indices at or above it are FEC parity shards, handed back unverified and
/// unwritten for [`FecGroups`] to fold into its reconstruction pool.
async fn process_one_chunk(
    stream: &mut quantarax_transport::Stream,
    manifest: &Manifest,
    payload_key: &[u8; 32],
    nonces: &NonceSequence,
    file: &StdMutex<std::fs::File>,
    cas: &Arc<dyn ContentStore>,
) -> std::result::Result<(u32, ChunkKind, Vec<u8>), (u32, &'static str)> {
    let mut header_buf = [0u8; quantarax_protocol::wire::frame::HEADER_LEN];
    read_exact_stream(stream, &mut header_buf).await.map_err(|_| (u32::MAX, "stream_closed"))?;
    let header = ChunkFrameHeader::decode(&header_buf).map_err(|_| (u32::MAX, "bad_header"))?;

    let mut payload = vec![0u8; header.payload_length as usize];
    read_exact_stream(stream, &mut payload).await.map_err(|_| (header.chunk_index, "stream_closed"))?;

    let frame = ChunkFrame { session_id: header.session_id, chunk_index: header.chunk_index, ciphertext: payload };
    let index = frame.chunk_index;

    let aad = ChunkFrame::aad(&frame.session_id, index);
    let nonce = nonces.nonce_for(index as u64);
    let plaintext =
        aes_gcm::open(payload_key, &nonce, &frame.ciphertext, &aad).map_err(|_| (index, "decrypt_failed"))?;

    if index >= manifest.chunk_count {
        return Ok((index, ChunkKind::Parity, plaintext));
    }

    let descriptor = manifest.chunks.get(index as usize).ok_or((index, "unknown_index"))?;
    let digest = blake3::hash(&plaintext);
    let expected = decode_hash(&descriptor.hash).map_err(|_| (index, "hash_mismatch"))?;
    if digest != expected {
        return Err((index, "hash_mismatch"));
    }

    write_chunk_to_disk(file, manifest, index, &plaintext).map_err(|_| (index, "io_error"))?;
    let _ = cas.put(&expected, unix_now());

    Ok((index, ChunkKind::Data, plaintext))
}

async fn read_exact_stream(stream: &mut quantarax_transport::Stream, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream
            .read(&mut buf[filled..])
            .await
            .map_err(EngineError::Transport)?
            .ok_or_else(|| EngineError::Handshake("chunk stream closed mid-frame".into()))?;
        if n == 0 {
            return Err(EngineError::Handshake("chunk stream closed mid-frame".into()));
        }
        filled += n;
    }
    Ok(())
}

fn finalize(
    manifest: &Manifest,
    file: &StdMutex<std::fs::File>,
    identity: &Ed25519Signer,
    session_id_str: &str,
) -> Result<VerificationMessage> {
    let mut leaves = Vec::with_capacity(manifest.chunks.len());
    {
        let mut f = file.lock().unwrap();
        f.sync_all().map_err(EngineError::Io)?;
        for descriptor in &manifest.chunks {
            let offset = descriptor.index as u64 * manifest.chunk_size as u64;
            let mut buf = vec![0u8; descriptor.length as usize];
            f.seek(SeekFrom::Start(offset)).map_err(EngineError::Io)?;
            f.read_exact(&mut buf).map_err(EngineError::Io)?;
            leaves.push(blake3::hash(&buf));
        }
    }
    let computed = quantarax_crypto::hash::merkle::merkle_root(&leaves);
    let expected = manifest.merkle_root_bytes().map_err(EngineError::Protocol)?;

    let status = if computed == expected { VerificationStatus::Success } else { VerificationStatus::HashMismatch };

    let mut msg = VerificationMessage {
        session_id: session_id_str.to_string(),
        status,
        merkle_computed: STANDARD.encode(computed),
        merkle_expected: STANDARD.encode(expected),
        timestamp: unix_now(),
        signature: Vec::new(),
        public_key: identity.verifying_key_bytes(),
    };
    let signing_bytes = serde_json::to_vec(&VerificationSigningBytes {
        session_id: &msg.session_id,
        status: msg.status,
        merkle_computed: &msg.merkle_computed,
        merkle_expected: &msg.merkle_expected,
        timestamp: msg.timestamp,
    })
    .map_err(|e| EngineError::Handshake(e.to_string()))?;
    msg.signature = identity.sign(&signing_bytes).to_vec();

    Ok(msg)
}

/// Matches the documented signing payload for [`VerificationMessage`]:
/// `{session_id, status, merkle_computed, merkle_expected, timestamp}`.
#[derive(serde::Serialize)]
struct VerificationSigningBytes<'a> {
    session_id: &'a str,
    status: VerificationStatus,
    merkle_computed: &'a str,
    merkle_expected: &'a str,
    timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_hash_rejects_wrong_length() {
        let short = STANDARD.encode([1u8; 16]);
        assert!(decode_hash(&short).is_err());
    }

    #[test]
    fn decode_hash_accepts_32_bytes() {
        let encoded = STANDARD.encode([7u8; 32]);
        assert_eq!(decode_hash(&encoded).unwrap(), [7u8; 32]);
    }

    fn padded_shard(byte: u8, len: usize) -> Vec<u8> {
        vec![byte; len]
    }

    fn make_group_parity(k: usize, r: usize, shard_len: usize, data: &[Vec<u8>]) -> Vec<Vec<u8>> {
        let codec = FecCodec::new(FecParams { k, r }).unwrap();
        codec.encode(data).unwrap()
    }

    #[test]
    fn reconstructs_a_missing_data_shard_from_parity_arriving_out_of_order() {
        let k = 3;
        let r = 2;
        let shard_len = 8;
        let data: Vec<Vec<u8>> =
            (0..k as u8).map(|i| padded_shard(i + 1, shard_len)).collect();
        let parity = make_group_parity(k, r, shard_len, &data);

        let mut groups = FecGroups::new(k, r, k as u32);

        // chunk 0 missing; feed chunk 1, chunk 2 (data), then both parity
        // shards, with parity arriving before the last data shard.
        assert!(groups
            .record_and_reconstruct(1, ChunkKind::Data, data[1].clone(), shard_len)
            .is_empty());
        assert!(groups
            .record_and_reconstruct(k as u32, ChunkKind::Parity, parity[0].clone(), shard_len)
            .is_empty());
        assert!(groups
            .record_and_reconstruct(k as u32 + 1, ChunkKind::Parity, parity[1].clone(), shard_len)
            .is_empty());

        let recovered =
            groups.record_and_reconstruct(2, ChunkKind::Data, data[2].clone(), shard_len);
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].0, 0);
        assert_eq!(&recovered[0].1[..], &data[0][..]);
    }

    #[test]
    fn never_recovers_the_same_chunk_twice() {
        let k = 2;
        let r = 2;
        let shard_len = 4;
        let data: Vec<Vec<u8>> = (0..k as u8).map(|i| padded_shard(i + 9, shard_len)).collect();
        let parity = make_group_parity(k, r, shard_len, &data);

        let mut groups = FecGroups::new(k, r, k as u32);
        assert!(groups
            .record_and_reconstruct(1, ChunkKind::Data, data[1].clone(), shard_len)
            .is_empty());
        let first = groups.record_and_reconstruct(
            k as u32,
            ChunkKind::Parity,
            parity[0].clone(),
            shard_len,
        );
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].0, 0);

        // A second parity shard for the same (already-complete) group must
        // not re-emit chunk 0.
        let second = groups.record_and_reconstruct(
            k as u32 + 1,
            ChunkKind::Parity,
            parity[1].clone(),
            shard_len,
        );
        assert!(second.is_empty());
    }

    #[test]
    fn more_than_r_missing_shards_never_reconstructs() {
        let k = 4;
        let r = 1;
        let shard_len = 4;
        let mut groups = FecGroups::new(k, r, k as u32);

        // Only one of k+r=5 slots ever arrives; reconstruction must never
        // fire regardless of how many calls are made.
        let recovered =
            groups.record_and_reconstruct(0, ChunkKind::Data, padded_shard(1, shard_len), shard_len);
        assert!(recovered.is_empty());
    }

    #[test]
    fn locate_maps_data_and_parity_indices_to_distinct_group_slots() {
        let groups = FecGroups::new(3, 2, 7);
        assert_eq!(groups.locate(0, ChunkKind::Data), Some((0, 0)));
        assert_eq!(groups.locate(3, ChunkKind::Data), Some((1, 0)));
        assert_eq!(groups.locate(6, ChunkKind::Data), Some((2, 0)));
        // chunk_count=7 is not itself a data index.
        assert_eq!(groups.locate(7, ChunkKind::Data), None);
        // first parity shard of group 0 lands in slot k.
        assert_eq!(groups.locate(7, ChunkKind::Parity), Some((0, 3)));
        assert_eq!(groups.locate(9, ChunkKind::Parity), Some((1, 3)));
    }
}
