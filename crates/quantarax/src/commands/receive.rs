//! Receive command implementation

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use quantarax_protocol::transfer::{Direction, SessionState};
use quantarax_store::cas::SqliteContentStore;
use quantarax_store::config::load_config;
use quantarax_store::persistence::{db_file, identity_file};
use quantarax_store::session::{Session, SessionStore};

use crate::cli::ReceiveArgs;
use crate::engine;

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Execute the receive command
pub async fn execute(args: ReceiveArgs) -> anyhow::Result<()> {
    let identity = quantarax_store::identity::load_or_generate(&identity_file()?)?;

    let config = load_config()?;
    let download_dir = args.output.unwrap_or(config.transfer.download_dir);
    std::fs::create_dir_all(&download_dir)?;

    let db_conn = quantarax_store::db::open(&db_file()?)?;
    let sessions = Arc::new(SessionStore::new(db_conn));

    let cas_conn = quantarax_store::db::open(&db_file()?)?;
    let cas = Arc::new(SqliteContentStore::new(cas_conn));

    crate::output::color::info(&format!("listening on {}", args.listen));
    let listener = quantarax_transport::listen(args.listen)?;
    let conn = Arc::new(listener.accept().await?);
    crate::output::color::info(&format!("accepted connection from {}", conn.remote_address()));

    let outcome =
        engine::receiver::receive_file(conn, &download_dir, cas, &identity, sessions.clone()).await;

    let now = unix_now();
    match outcome {
        Ok(o) => {
            let file_size = std::fs::metadata(&o.output_path).map(|m| m.len()).unwrap_or(0);
            let _ = sessions.add(
                Session {
                    session_id: o.session_id,
                    file_path: o.output_path.clone(),
                    file_name: o.output_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                    file_size,
                    chunk_size: 0,
                    total_chunks: 0,
                    direction: Direction::Receive,
                    state: if o.verified { SessionState::Completed } else { SessionState::Failed },
                    created_at: now,
                    updated_at: now,
                    metadata: serde_json::Value::Null,
                },
                now,
            );

            if o.verified {
                crate::output::color::success(&format!(
                    "received {} ({})",
                    o.output_path.display(),
                    crate::output::format_size(file_size)
                ));
                Ok(())
            } else {
                anyhow::bail!("received {} but Merkle verification failed", o.output_path.display())
            }
        }
        Err(e) => Err(e.into()),
    }
}
