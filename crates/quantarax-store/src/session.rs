//! Persistent session records and resume bitmaps (C5/C13).

use std::path::PathBuf;
use std::sync::Mutex;

use quantarax_protocol::transfer::{Direction, ResumeBitmap, SessionState};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::{Result, StoreError};

/// A durable transfer session record, matching the `sessions` table layout
/// in the external interface spec.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
    pub chunk_size: u32,
    pub total_chunks: u32,
    pub direction: Direction,
    pub state: SessionState,
    pub created_at: u64,
    pub updated_at: u64,
    pub metadata: serde_json::Value,
}

/// Filter applied by [`SessionStore::list`].
#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    pub direction: Option<Direction>,
    pub state: Option<SessionState>,
}

fn direction_str(d: Direction) -> &'static str {
    match d {
        Direction::Send => "SEND",
        Direction::Receive => "RECEIVE",
    }
}

fn direction_from_str(s: &str) -> Result<Direction> {
    match s {
        "SEND" => Ok(Direction::Send),
        "RECEIVE" => Ok(Direction::Receive),
        other => Err(StoreError::Storage(format!("unknown direction in row: {other}"))),
    }
}

fn state_str(s: SessionState) -> &'static str {
    match s {
        SessionState::Pending => "PENDING",
        SessionState::Active => "ACTIVE",
        SessionState::Paused => "PAUSED",
        SessionState::Completed => "COMPLETED",
        SessionState::Failed => "FAILED",
    }
}

fn state_from_str(s: &str) -> Result<SessionState> {
    match s {
        "PENDING" => Ok(SessionState::Pending),
        "ACTIVE" => Ok(SessionState::Active),
        "PAUSED" => Ok(SessionState::Paused),
        "COMPLETED" => Ok(SessionState::Completed),
        "FAILED" => Ok(SessionState::Failed),
        other => Err(StoreError::Storage(format!("unknown session state in row: {other}"))),
    }
}

fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    let id_text: String = row.get("session_id")?;
    let direction_text: String = row.get("direction")?;
    let state_text: String = row.get("state")?;
    let metadata_text: String = row.get("metadata_json")?;

    Ok(Session {
        session_id: Uuid::parse_str(&id_text).unwrap_or_else(|_| Uuid::nil()),
        file_path: PathBuf::from(row.get::<_, String>("file_path")?),
        file_name: row.get("file_name")?,
        file_size: row.get::<_, i64>("file_size")? as u64,
        chunk_size: row.get::<_, i64>("chunk_size")? as u32,
        total_chunks: row.get::<_, i64>("total_chunks")? as u32,
        direction: direction_from_str(&direction_text).unwrap_or(Direction::Send),
        state: state_from_str(&state_text).unwrap_or(SessionState::Failed),
        created_at: row.get::<_, i64>("created_at")? as u64,
        updated_at: row.get::<_, i64>("updated_at")? as u64,
        metadata: serde_json::from_str(&metadata_text).unwrap_or(serde_json::Value::Null),
    })
}

/// Durable store of transfer sessions and their resume bitmaps, backed by
/// SQLite. Interior mutability is via a single mutex, matching the
/// reader-writer lock the session store specifies — sqlite itself
/// serializes writers, so one connection-wide lock is sufficient.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Wrap an already-opened, schema-initialized connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Insert a new session. Fails with [`StoreError::SessionExists`] if the
    /// id is already present.
    pub fn add(&self, session: &Session, now: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sessions WHERE session_id = ?1",
                params![session.session_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::SessionExists);
        }
        conn.execute(
            "INSERT INTO sessions (session_id, file_path, file_name, file_size, chunk_size, \
             total_chunks, direction, state, created_at, updated_at, metadata_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10)",
            params![
                session.session_id.to_string(),
                session.file_path.to_string_lossy(),
                session.file_name,
                session.file_size as i64,
                session.chunk_size as i64,
                session.total_chunks as i64,
                direction_str(session.direction),
                state_str(session.state),
                now as i64,
                session.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a session by id.
    pub fn get(&self, id: Uuid) -> Result<Session> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM sessions WHERE session_id = ?1",
            params![id.to_string()],
            row_to_session,
        )
        .optional()?
        .ok_or(StoreError::SessionNotFound)
    }

    /// Transition a session to `next`, validating against the state machine
    /// before persisting.
    pub fn transition(&self, id: Uuid, next: SessionState, now: u64) -> Result<()> {
        let current = self.get(id)?;
        current.state.validate_transition(next).map_err(|e| StoreError::Storage(e.to_string()))?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET state = ?1, updated_at = ?2 WHERE session_id = ?3",
            params![state_str(next), now as i64, id.to_string()],
        )?;
        Ok(())
    }

    /// Remove sessions in a terminal state whose `updated_at` is older than
    /// `now - max_age_secs`.
    pub fn cleanup_old(&self, max_age_secs: u64, now: u64) -> Result<usize> {
        let cutoff = now.saturating_sub(max_age_secs) as i64;
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM sessions WHERE state IN ('COMPLETED', 'FAILED') AND updated_at < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    /// List sessions matching `filter`, paginated by `limit`/`offset`.
    /// Returns the page plus the total matching count.
    pub fn list(&self, filter: &SessionFilter, limit: usize, offset: usize) -> Result<(Vec<Session>, usize)> {
        let conn = self.conn.lock().unwrap();
        let mut clauses = Vec::new();
        if let Some(d) = filter.direction {
            clauses.push(format!("direction = '{}'", direction_str(d)));
        }
        if let Some(s) = filter.state {
            clauses.push(format!("state = '{}'", state_str(s)));
        }
        let where_clause =
            if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };

        let total: i64 =
            conn.query_row(&format!("SELECT count(*) FROM sessions {where_clause}"), [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM sessions {where_clause} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let sessions = stmt
            .query_map(params![limit as i64, offset as i64], row_to_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((sessions, total as usize))
    }

    /// Set chunk `index` as received for `session_id`, creating the bitmap
    /// row if it doesn't exist yet. Atomic and idempotent.
    pub fn set_chunk(&self, session_id: Uuid, index: u32, total: u32, now: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let mut bitmap = load_bitmap_locked(&conn, session_id, total)?;
        bitmap.set(index).map_err(|e| StoreError::Storage(e.to_string()))?;
        upsert_bitmap_locked(&conn, session_id, &bitmap, now)
    }

    /// Load the resume bitmap for `session_id`, recomputing
    /// `received_count` from the stored blob. Returns a fresh all-zero
    /// bitmap if none has been persisted yet.
    pub fn load_bitmap(&self, session_id: Uuid, total: u32) -> Result<ResumeBitmap> {
        let conn = self.conn.lock().unwrap();
        load_bitmap_locked(&conn, session_id, total)
    }
}

fn load_bitmap_locked(conn: &Connection, session_id: Uuid, total: u32) -> Result<ResumeBitmap> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT bitmap_data FROM chunk_bitmaps WHERE session_id = ?1",
            params![session_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match blob {
        Some(bytes) => ResumeBitmap::from_bytes(&bytes, total).map_err(|e| StoreError::Storage(e.to_string())),
        None => Ok(ResumeBitmap::new(total)),
    }
}

fn upsert_bitmap_locked(conn: &Connection, session_id: Uuid, bitmap: &ResumeBitmap, now: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO chunk_bitmaps (session_id, bitmap_data, chunks_received, last_updated) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(session_id) DO UPDATE SET \
           bitmap_data = excluded.bitmap_data, \
           chunks_received = excluded.chunks_received, \
           last_updated = excluded.last_updated",
        params![session_id.to_string(), bitmap.to_bytes(), bitmap.received_count() as i64, now as i64],
    )?;
    Ok(())
}
