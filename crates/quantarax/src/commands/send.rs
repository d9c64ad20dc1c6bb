//! Send command implementation

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use quantarax_protocol::transfer::{compute_manifest, ChunkOptions, Direction, SessionState};
use quantarax_store::dtn::DtnQueue;
use quantarax_store::persistence::{db_file, identity_file};
use quantarax_store::session::{Session, SessionStore};

use crate::cli::SendArgs;
use crate::engine;
use crate::output::progress::TransferProgressBar;

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Execute the send command
pub async fn execute(args: SendArgs) -> anyhow::Result<()> {
    let identity = quantarax_store::identity::load_or_generate(&identity_file()?)?;

    let manifest = compute_manifest(&args.file, ChunkOptions { chunk_size: args.chunk_size })?;
    crate::output::color::info(&format!(
        "sending {} ({} chunks, {})",
        manifest.file_name,
        manifest.chunk_count,
        crate::output::format_size(manifest.file_size)
    ));

    let db_conn = quantarax_store::db::open(&db_file()?)?;
    let sessions = SessionStore::new(db_conn);
    let now = unix_now();
    sessions.add(
        Session {
            session_id: manifest.session_id,
            file_path: args.file.clone(),
            file_name: manifest.file_name.clone(),
            file_size: manifest.file_size,
            chunk_size: manifest.chunk_size,
            total_chunks: manifest.chunk_count,
            direction: Direction::Send,
            state: SessionState::Active,
            created_at: now,
            updated_at: now,
            metadata: serde_json::Value::Null,
        },
        now,
    )?;

    let conn = Arc::new(quantarax_transport::dial(args.peer).await?);

    let dtn_conn = quantarax_store::db::open(&db_file()?)?;
    let dtn = Arc::new(DtnQueue::new(dtn_conn));

    let mut progress = TransferProgressBar::new(manifest.file_size);
    progress.update(0);

    let session_id = manifest.session_id;
    let outcome = engine::sender::send_file(
        conn,
        manifest,
        args.file,
        &identity,
        args.domain.as_deref(),
        Some(dtn),
    )
    .await;

    progress.finish();

    let final_state = if matches!(outcome, Ok(ref o) if o.verified) { SessionState::Completed } else { SessionState::Failed };
    let _ = sessions.transition(session_id, final_state, unix_now());

    match outcome {
        Ok(o) if o.verified => {
            crate::output::color::success(&format!("transfer {} verified", o.session_id));
            Ok(())
        }
        Ok(o) => anyhow::bail!("transfer {} completed but failed verification", o.session_id),
        Err(e) => Err(e.into()),
    }
}
