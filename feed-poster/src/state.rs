use crate::types::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Durable record of entry ids that have already been published.
///
/// Rows are only ever inserted. Whether an entry is handled depends on
/// nothing but the presence of its id, so a crash between publishing and
/// recording leads to a retry on the next run, never to a silent skip.
pub struct EntryStore {
    db: SqlitePool,
}

impl EntryStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn has_posted(&self, entry_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM posted_ids WHERE eid = ?")
            .bind(entry_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.is_some())
    }

    /// Idempotent: recording an id twice is a no-op. The statement runs in
    /// autocommit mode, so the id is durable once this returns.
    pub async fn mark_posted(&self, entry_id: &str) -> Result<()> {
        let result = sqlx::query("INSERT OR IGNORE INTO posted_ids (eid) VALUES (?)")
            .bind(entry_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            debug!("Entry {} was already recorded", entry_id);
        }

        Ok(())
    }

    pub async fn posted_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posted_ids")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}
