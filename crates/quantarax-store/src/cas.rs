//! Content-addressed store (C4): durable presence tracking for chunk
//! hashes, keyed by their 32-byte BLAKE3 digest.

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::Result;

/// Capability set for a content-addressed store. In-memory and durable
/// backends are interchangeable behind this interface.
pub trait ContentStore: Send + Sync {
    /// Whether `hash` has been recorded.
    fn has(&self, hash: &[u8; 32]) -> Result<bool>;

    /// Record `hash` as present, stamped with `now` (unix seconds).
    fn put(&self, hash: &[u8; 32], now: u64) -> Result<()>;

    /// Remove entries stamped before `now - max_age`. Returns the count
    /// removed.
    fn gc(&self, max_age_secs: u64, now: u64) -> Result<usize>;
}

/// SQLite-backed content store: 32-byte hash key to an 8-byte big-endian
/// unix timestamp value, as specified in the external interfaces.
pub struct SqliteContentStore {
    conn: Mutex<Connection>,
}

impl SqliteContentStore {
    /// Wrap an already schema-initialized connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }
}

impl ContentStore for SqliteContentStore {
    fn has(&self, hash: &[u8; 32]) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> =
            conn.query_row("SELECT 1 FROM cas WHERE hash = ?1", params![hash.as_slice()], |row| row.get(0)).optional()?;
        Ok(found.is_some())
    }

    fn put(&self, hash: &[u8; 32], now: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cas (hash, stored_at) VALUES (?1, ?2) ON CONFLICT(hash) DO UPDATE SET stored_at = excluded.stored_at",
            params![hash.as_slice(), now.to_be_bytes().as_slice()],
        )?;
        Ok(())
    }

    fn gc(&self, max_age_secs: u64, now: u64) -> Result<usize> {
        let cutoff = now.saturating_sub(max_age_secs).to_be_bytes();
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT hash, stored_at FROM cas")?;
        let stale: Vec<Vec<u8>> = stmt
            .query_map([], |row| {
                let hash: Vec<u8> = row.get(0)?;
                let stored_at: Vec<u8> = row.get(1)?;
                Ok((hash, stored_at))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|(_, stored_at)| stored_at.as_slice() < cutoff.as_slice())
            .map(|(hash, _)| hash)
            .collect();

        for hash in &stale {
            conn.execute("DELETE FROM cas WHERE hash = ?1", params![hash])?;
        }
        Ok(stale.len())
    }
}

/// In-memory content store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryContentStore {
    entries: Mutex<HashMap<[u8; 32], u64>>,
}

impl InMemoryContentStore {
    /// An empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentStore for InMemoryContentStore {
    fn has(&self, hash: &[u8; 32]) -> Result<bool> {
        Ok(self.entries.lock().unwrap().contains_key(hash))
    }

    fn put(&self, hash: &[u8; 32], now: u64) -> Result<()> {
        self.entries.lock().unwrap().insert(*hash, now);
        Ok(())
    }

    fn gc(&self, max_age_secs: u64, now: u64) -> Result<usize> {
        let cutoff = now.saturating_sub(max_age_secs);
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, stored_at| *stored_at >= cutoff);
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn hash_of(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[test]
    fn in_memory_has_put_gc() {
        let store = InMemoryContentStore::new();
        let hash = hash_of(1);
        assert!(!store.has(&hash).unwrap());
        store.put(&hash, 1_000).unwrap();
        assert!(store.has(&hash).unwrap());

        let removed = store.gc(100, 2_000).unwrap();
        assert_eq!(removed, 1);
        assert!(!store.has(&hash).unwrap());
    }

    #[test]
    fn sqlite_has_put_gc() {
        let store = SqliteContentStore::new(db::open_in_memory().unwrap());
        let hash = hash_of(7);
        store.put(&hash, 1_000).unwrap();
        assert!(store.has(&hash).unwrap());
        assert_eq!(store.gc(10_000, 1_100).unwrap(), 0);
        assert_eq!(store.gc(50, 2_000).unwrap(), 1);
        assert!(!store.has(&hash).unwrap());
    }

    #[test]
    fn put_is_idempotent_on_repeated_hash() {
        let store = InMemoryContentStore::new();
        let hash = hash_of(3);
        store.put(&hash, 1_000).unwrap();
        store.put(&hash, 2_000).unwrap();
        assert!(store.has(&hash).unwrap());
    }
}
