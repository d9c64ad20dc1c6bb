//! SQLite-backed persistence for sessions, resume bitmaps, the
//! content-addressed store, and the DTN retry queue (C4/C5/C12/C13).

use rusqlite::Connection;

use crate::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    session_id    TEXT PRIMARY KEY,
    file_path     TEXT NOT NULL,
    file_name     TEXT NOT NULL,
    file_size     INTEGER NOT NULL,
    chunk_size    INTEGER NOT NULL,
    total_chunks  INTEGER NOT NULL,
    direction     TEXT NOT NULL,
    state         TEXT NOT NULL,
    created_at    INTEGER NOT NULL,
    updated_at    INTEGER NOT NULL,
    metadata_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunk_bitmaps (
    session_id     TEXT PRIMARY KEY REFERENCES sessions(session_id),
    bitmap_data    BLOB NOT NULL,
    chunks_received INTEGER NOT NULL,
    last_updated   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cas (
    hash      BLOB PRIMARY KEY,
    stored_at BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS dtn_queue (
    rowid       INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    priority    INTEGER NOT NULL,
    expire_at   INTEGER NOT NULL,
    retries     INTEGER NOT NULL DEFAULT 0
);
";

/// Open (creating if needed) the SQLite database at `path` and apply the
/// schema. Pass `:memory:` for an ephemeral, process-local database.
pub fn open(path: &std::path::Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Open an in-memory database, useful for tests and `--ephemeral` runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}
