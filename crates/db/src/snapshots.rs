use rusqlite::{OptionalExtension, params};

use crate::Db;
use crate::error::Result;

impl Db {
    /// Append one immutable audit row per submission event. Snapshots are
    /// read only for "last synced" display, never by the ranker.
    pub fn insert_snapshot(
        &self,
        user_id: &str,
        reported_at: &str,
        total_tokens: u64,
        total_commits: u64,
        payload_json: &str,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO metrics_snapshots (user_id, reported_at, total_tokens, total_commits, payload)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                user_id,
                reported_at,
                total_tokens as i64,
                total_commits as i64,
                payload_json
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn latest_reported_at(&self, user_id: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                r#"
                SELECT reported_at
                FROM metrics_snapshots
                WHERE user_id = ?1
                ORDER BY id DESC
                LIMIT 1
                "#,
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(crate::error::DbError::from)
    }

    pub fn snapshot_count(&self, user_id: &str) -> Result<u64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM metrics_snapshots WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, i64>(0),
            )
            .map(|value| value as u64)
            .map_err(crate::error::DbError::from)
    }
}
