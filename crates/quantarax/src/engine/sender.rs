//! Sender orchestrator (C9).
//!
//! Drives one outbound transfer end to end: handshake, chunk-have
//! preflight, the preview/bulk enqueue split, NACK-reactive retransmission,
//! and the FEC/autotuner control loop. Runs as a single task rather than a
//! separate spawned control-listener, since [`ControlChannel`] owns its
//! stream outright and isn't cheaply split across tasks; `tokio::select!`
//! over the control channel, the scheduler's outcome channel, and a tick
//! timer gets the same reactive behavior without that split.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use quantarax_crypto::sig::ed25519::Ed25519Signer;
use quantarax_crypto::symmetric::{aes_gcm, nonce::NonceSequence};
use quantarax_protocol::domain::{self, DomainProfile};
use quantarax_protocol::fec::{FecCodec, FecParams};
use quantarax_protocol::transfer::{read_chunk, Manifest};
use quantarax_protocol::wire::messages::{
    ChunkHaveRequestMessage, ControlMessage, ManifestMessage, NackMessage,
};
use quantarax_protocol::wire::{decompress_ranges, ChunkFrame, PROTOCOL_VERSION};
use quantarax_store::dtn::{DtnItem, DtnQueue};
use quantarax_transport::Conn;
use tokio::time::interval;

use super::control::ControlChannel;
use super::error::{EngineError, Result};
use super::handshake;
use super::scheduler::{ChunkOutcome, ChunkTask, PriorityClass, Scheduler};
use super::tuner::{Autotuner, FecController};

const PREVIEW_CHUNKS: u32 = 3;
const HAVE_RESPONSE_WAIT: Duration = Duration::from_millis(500);
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of a completed (or abandoned) send.
pub struct SendOutcome {
    pub session_id: String,
    pub verified: bool,
}

fn unix_now() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn session_id_bytes(manifest: &Manifest) -> [u8; 16] {
    *manifest.session_id.as_bytes()
}

fn encrypt_bytes(
    session_id: [u8; 16],
    payload_key: &[u8; 32],
    nonces: &NonceSequence,
    index: u32,
    plaintext: &[u8],
) -> Result<ChunkFrame> {
    let aad = ChunkFrame::aad(&session_id, index);
    let nonce = nonces.nonce_for(index as u64);
    let ciphertext = aes_gcm::seal(payload_key, &nonce, plaintext, &aad)?;
    Ok(ChunkFrame::new(session_id, index, ciphertext))
}

fn encrypt_chunk(
    file_path: &Path,
    manifest: &Manifest,
    payload_key: &[u8; 32],
    nonces: &NonceSequence,
    index: u32,
) -> Result<ChunkFrame> {
    let descriptor = manifest
        .chunks
        .get(index as usize)
        .ok_or_else(|| EngineError::Handshake(format!("no such chunk index {index}")))?;
    let plaintext = read_chunk(file_path, index, manifest.chunk_size, descriptor.length as usize)?;
    let session_id = session_id_bytes(manifest);
    encrypt_bytes(session_id, payload_key, nonces, index, &plaintext)
}

/// Build and transmit the `R` Reed-Solomon parity shards for one FEC group
/// of `fec_k` consecutive data chunks starting at `group_id * fec_k`. Parity
/// shards occupy the chunk-index range starting at `chunk_count`, riding the
/// same per-chunk stream/scheduler path as data chunks. Each data shard is
/// zero-padded to `chunk_size` before encoding, since Reed-Solomon requires
/// equal-length shards and only the file's final chunk can be shorter.
#[allow(clippy::too_many_arguments)]
async fn enqueue_fec_group(
    scheduler: &Scheduler,
    file_path: &Path,
    manifest: &Manifest,
    payload_key: &[u8; 32],
    nonces: &NonceSequence,
    fec_k: usize,
    fec_r: usize,
    group_id: u32,
) -> Result<()> {
    let start = group_id * fec_k as u32;
    let group_len = (manifest.chunk_count.saturating_sub(start) as usize).min(fec_k);
    if group_len == 0 {
        return Ok(());
    }

    let shard_len = manifest.chunk_size as usize;
    let mut shards = Vec::with_capacity(group_len);
    for offset in 0..group_len as u32 {
        let index = start + offset;
        let descriptor = manifest
            .chunks
            .get(index as usize)
            .ok_or_else(|| EngineError::Handshake(format!("no such chunk index {index}")))?;
        let mut plaintext = read_chunk(file_path, index, manifest.chunk_size, descriptor.length as usize)?;
        plaintext.resize(shard_len, 0);
        shards.push(plaintext);
    }

    let codec = FecCodec::new(FecParams { k: group_len, r: fec_r }).map_err(EngineError::Protocol)?;
    let parity = codec.encode(&shards).map_err(EngineError::Protocol)?;

    let session_id = session_id_bytes(manifest);
    for (offset, shard) in parity.into_iter().enumerate() {
        let index = manifest.chunk_count + group_id * fec_r as u32 + offset as u32;
        let frame = encrypt_bytes(session_id, payload_key, nonces, index, &shard)?;
        scheduler.enqueue(ChunkTask { chunk_index: index, class: PriorityClass::P2, frame_bytes: frame.encode() }).await?;
    }
    Ok(())
}

/// Send `file_path` per `manifest` over an already-connected `conn`.
pub async fn send_file(
    conn: Arc<Conn>,
    mut manifest: Manifest,
    file_path: PathBuf,
    signer: &Ed25519Signer,
    domain_profile: Option<&str>,
    dtn: Option<Arc<DtnQueue>>,
) -> Result<SendOutcome> {
    let mut control_stream = conn.open_stream().await.map_err(EngineError::Transport)?;
    let shared = handshake::exchange_ephemeral_keys(&mut control_stream).await?;

    if manifest.signature.is_none() {
        manifest.sign(signer)?;
    }
    let keys = handshake::derive_keys(&shared, &manifest)?;

    let mut control = ControlChannel::new(control_stream);
    let session_id = manifest.session_id.to_string();

    let manifest_bytes = manifest.signing_bytes().map_err(EngineError::Protocol)?;
    control
        .send(ControlMessage::Manifest(ManifestMessage {
            manifest_json_bytes: manifest_bytes,
            signature: manifest.signature.clone().unwrap_or_default(),
            public_key: signer.verifying_key_bytes(),
            protocol_version: PROTOCOL_VERSION,
        }))
        .await?;

    control
        .send(ControlMessage::ChunkHaveRequest(ChunkHaveRequestMessage {
            session_id: session_id.clone(),
            chunk_count: manifest.chunk_count,
        }))
        .await?;

    let mut already_present = vec![false; manifest.chunk_count as usize];
    control.set_deadline(Some(HAVE_RESPONSE_WAIT));
    if let Ok(Some(ControlMessage::ChunkHaveResponse(resp))) = control.recv().await {
        for idx in decompress_ranges(&resp.have_ranges).map_err(EngineError::Protocol)? {
            if let Some(slot) = already_present.get_mut(idx as usize) {
                *slot = true;
            }
        }
    }
    control.set_deadline(None);

    let profile = domain_profile
        .map(domain::by_name)
        .transpose()
        .map_err(EngineError::Protocol)?
        .unwrap_or(domain::MEDIA);

    let (scheduler, mut outcomes) = Scheduler::new(conn.clone(), manifest.chunk_size);
    scale_to_profile(&scheduler, &profile).await;

    let (fec_k, fec_r) = manifest.fec.as_ref().map(|f| (f.k, f.r)).unwrap_or((profile.fec.k, profile.fec.r));
    let mut fec_controller = FecController::new(session_id.clone(), fec_k, fec_r);
    let mut autotuner = Autotuner::new(Instant::now());

    let payload_key = keys.payload_key;
    let nonces = NonceSequence::new(keys.iv_base, false);

    let mut pending: Vec<u32> =
        (0..manifest.chunk_count).filter(|i| !already_present[*i as usize]).collect();
    let preview: Vec<u32> = pending.iter().take(PREVIEW_CHUNKS as usize).copied().collect();
    pending.retain(|i| !preview.contains(i));

    for index in &preview {
        enqueue_one(&scheduler, &file_path, &manifest, &payload_key, &nonces, *index, PriorityClass::P1).await?;
    }
    for index in &pending {
        enqueue_one(&scheduler, &file_path, &manifest, &payload_key, &nonces, *index, PriorityClass::P2).await?;
    }

    let num_fec_groups =
        if fec_k == 0 { 0 } else { (manifest.chunk_count as usize).div_ceil(fec_k) as u32 };
    for group_id in 0..num_fec_groups {
        enqueue_fec_group(&scheduler, &file_path, &manifest, &payload_key, &nonces, fec_k, fec_r, group_id).await?;
    }

    let mut ticker = interval(TICK_INTERVAL);
    let verified;

    loop {
        tokio::select! {
            msg = control.recv() => {
                match msg? {
                    Some(ControlMessage::Nack(nack)) => {
                        reenqueue_nack(&scheduler, &file_path, &manifest, &payload_key, &nonces, &nack).await?;
                    }
                    Some(ControlMessage::Verification(v)) => {
                        verified = matches!(v.status, quantarax_protocol::wire::messages::VerificationStatus::Success);
                        break;
                    }
                    Some(ControlMessage::Status(_)) | Some(ControlMessage::Ack(_)) => {}
                    Some(_) | None => {}
                }
            }
            outcome = outcomes.recv() => {
                match outcome {
                    Some(ChunkOutcome::Sent { .. }) => fec_controller.record_sent(1),
                    Some(ChunkOutcome::Failed { chunk_index, .. }) => {
                        fec_controller.record_sent(1);
                        fec_controller.record_lost(1);
                        if let (Some(ttl), Some(queue)) = (profile.dtn_ttl_seconds, dtn.as_ref()) {
                            let item = DtnItem {
                                session_id: manifest.session_id,
                                chunk_index,
                                priority: PriorityClass::P2 as i32,
                                expire_at: unix_now() + ttl,
                            };
                            let _ = queue.enqueue(&item);
                        }
                    }
                    None => {}
                }
            }
            _ = ticker.tick() => {
                if let Some(update) = fec_controller.tick(unix_now()) {
                    control.send(ControlMessage::FecUpdate(update)).await?;
                }
                if let Some(adj) = autotuner.tick(Instant::now(), 100.0, Duration::from_millis(40)) {
                    scheduler.set_chunk_size(PriorityClass::P1, adj.chunk_bytes);
                    scheduler.set_chunk_size(PriorityClass::P2, adj.chunk_bytes);
                    scheduler.scale(PriorityClass::P1, adj.p1_streams).await;
                    scheduler.scale(PriorityClass::P2, adj.p2_streams).await;
                }
                if let Some(queue) = dtn.as_ref() {
                    if let Ok(batch) = queue.dequeue_batch(16, unix_now()) {
                        for item in batch {
                            if item.session_id == manifest.session_id {
                                let _ = enqueue_one(
                                    &scheduler, &file_path, &manifest, &payload_key, &nonces,
                                    item.chunk_index, PriorityClass::P2,
                                ).await;
                            }
                        }
                    }
                }
            }
        }
    }

    scheduler.close().await;
    control.close().await?;

    Ok(SendOutcome { session_id, verified })
}

async fn scale_to_profile(scheduler: &Scheduler, profile: &DomainProfile) {
    scheduler.scale(PriorityClass::P0, profile.p0.streams as usize).await;
    scheduler.scale(PriorityClass::P1, profile.p1.streams as usize).await;
    scheduler.scale(PriorityClass::P2, profile.p2.streams as usize).await;
}

async fn enqueue_one(
    scheduler: &Scheduler,
    file_path: &Path,
    manifest: &Manifest,
    payload_key: &[u8; 32],
    nonces: &NonceSequence,
    index: u32,
    class: PriorityClass,
) -> Result<()> {
    let frame = encrypt_chunk(file_path, manifest, payload_key, nonces, index)?;
    scheduler
        .enqueue(ChunkTask { chunk_index: index, class, frame_bytes: frame.encode() })
        .await
}

async fn reenqueue_nack(
    scheduler: &Scheduler,
    file_path: &Path,
    manifest: &Manifest,
    payload_key: &[u8; 32],
    nonces: &NonceSequence,
    nack: &NackMessage,
) -> Result<()> {
    for index in decompress_ranges(&nack.missing_ranges).map_err(EngineError::Protocol)? {
        enqueue_one(scheduler, file_path, manifest, payload_key, nonces, index, PriorityClass::P2)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_split_takes_at_most_three() {
        let pending: Vec<u32> = (0..10).collect();
        let preview: Vec<u32> = pending.iter().take(PREVIEW_CHUNKS as usize).copied().collect();
        assert_eq!(preview, vec![0, 1, 2]);
    }
}
