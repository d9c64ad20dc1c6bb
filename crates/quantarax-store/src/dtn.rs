//! Delay-tolerant retry queue (C12): a durable FIFO for chunks that must be
//! retried later on high-loss or intermittent links.

use std::sync::Mutex;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::Result;

/// One item in the DTN retry queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtnItem {
    pub session_id: Uuid,
    pub chunk_index: u32,
    pub priority: i32,
    pub expire_at: u64,
}

/// Durable, ordered FIFO of [`DtnItem`]s.
pub struct DtnQueue {
    conn: Mutex<Connection>,
}

impl DtnQueue {
    /// Wrap an already schema-initialized connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Append an item to the queue.
    pub fn enqueue(&self, item: &DtnItem) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO dtn_queue (session_id, chunk_index, priority, expire_at, retries) \
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![item.session_id.to_string(), item.chunk_index, item.priority, item.expire_at as i64],
        )?;
        Ok(())
    }

    /// Re-enqueue `item` after a failed delivery attempt, recording one more
    /// retry. Returns `Ok(false)` without enqueuing if `max_retries` has been
    /// reached.
    pub fn retry(&self, item: &DtnItem, retries_so_far: u32, max_retries: u32) -> Result<bool> {
        if retries_so_far >= max_retries {
            return Ok(false);
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO dtn_queue (session_id, chunk_index, priority, expire_at, retries) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.session_id.to_string(),
                item.chunk_index,
                item.priority,
                item.expire_at as i64,
                (retries_so_far + 1) as i64
            ],
        )?;
        Ok(true)
    }

    /// Atomically remove and return up to `n` items, ordered by priority
    /// then insertion order, dropping any already past `now`.
    pub fn dequeue_batch(&self, n: usize, now: u64) -> Result<Vec<DtnItem>> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        let mut stmt = tx.prepare(
            "SELECT rowid, session_id, chunk_index, priority, expire_at FROM dtn_queue \
             ORDER BY priority ASC, rowid ASC LIMIT ?1",
        )?;
        let rows: Vec<(i64, DtnItem)> = stmt
            .query_map(params![n as i64], |row| {
                let id_text: String = row.get(1)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    DtnItem {
                        session_id: Uuid::parse_str(&id_text).unwrap_or_else(|_| Uuid::nil()),
                        chunk_index: row.get::<_, i64>(2)? as u32,
                        priority: row.get(3)?,
                        expire_at: row.get::<_, i64>(4)? as u64,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        for (rowid, _) in &rows {
            tx.execute("DELETE FROM dtn_queue WHERE rowid = ?1", params![rowid])?;
        }
        tx.commit()?;

        Ok(rows.into_iter().map(|(_, item)| item).filter(|item| item.expire_at > now).collect())
    }

    /// Number of items currently queued.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM dtn_queue", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn item(priority: i32, expire_at: u64) -> DtnItem {
        DtnItem { session_id: Uuid::new_v4(), chunk_index: 1, priority, expire_at }
    }

    #[test]
    fn enqueue_then_dequeue_batch_is_fifo_within_priority() {
        let queue = DtnQueue::new(db::open_in_memory().unwrap());
        queue.enqueue(&item(1, 10_000)).unwrap();
        queue.enqueue(&item(1, 10_000)).unwrap();
        queue.enqueue(&item(0, 10_000)).unwrap();

        let batch = queue.dequeue_batch(10, 0).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].priority, 0);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn expired_items_are_dropped_silently() {
        let queue = DtnQueue::new(db::open_in_memory().unwrap());
        queue.enqueue(&item(0, 100)).unwrap();
        let batch = queue.dequeue_batch(10, 200).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn dequeue_batch_respects_limit() {
        let queue = DtnQueue::new(db::open_in_memory().unwrap());
        for _ in 0..5 {
            queue.enqueue(&item(0, 10_000)).unwrap();
        }
        let batch = queue.dequeue_batch(2, 0).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.len().unwrap(), 3);
    }

    #[test]
    fn retry_stops_at_max_retries() {
        let queue = DtnQueue::new(db::open_in_memory().unwrap());
        let it = item(0, 10_000);
        assert!(queue.retry(&it, 2, 3).unwrap());
        assert!(!queue.retry(&it, 3, 3).unwrap());
    }
}
