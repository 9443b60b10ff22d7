use chrono::{SecondsFormat, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::Db;
use crate::error::Result;
use crate::types::{DeviceTokenRow, LinkingCodeRow};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_device_token(row: &Row<'_>) -> std::result::Result<DeviceTokenRow, rusqlite::Error> {
    Ok(DeviceTokenRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        org_id: row.get(2)?,
        label: row.get(3)?,
        created_at: row.get(4)?,
        last_used_at: row.get(5)?,
        revoked_at: row.get(6)?,
    })
}

impl Db {
    pub fn insert_linking_code(
        &self,
        code: &str,
        user_id: &str,
        org_id: Option<&str>,
        expires_at: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO linking_codes (code, user_id, org_id, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![code, user_id, org_id, now_rfc3339(), expires_at],
        )?;
        Ok(())
    }

    /// Consume a linking code exactly once. The guarded UPDATE is the
    /// atomicity point: an expired, unknown, or already-used code changes
    /// zero rows and yields `None`.
    pub fn claim_linking_code(&self, code: &str) -> Result<Option<LinkingCodeRow>> {
        let now = now_rfc3339();
        let changed = self.conn.execute(
            r#"
            UPDATE linking_codes
            SET used_at = ?2
            WHERE code = ?1 AND used_at IS NULL AND expires_at > ?2
            "#,
            params![code, now],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.conn
            .query_row(
                r#"
                SELECT code, user_id, org_id, created_at, expires_at, used_at
                FROM linking_codes
                WHERE code = ?1
                "#,
                params![code],
                |row| {
                    Ok(LinkingCodeRow {
                        code: row.get(0)?,
                        user_id: row.get(1)?,
                        org_id: row.get(2)?,
                        created_at: row.get(3)?,
                        expires_at: row.get(4)?,
                        used_at: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(crate::error::DbError::from)
    }

    pub fn insert_device_token(
        &self,
        token_hash: &str,
        user_id: &str,
        org_id: Option<&str>,
        label: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO device_tokens (token_hash, user_id, org_id, label, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![token_hash, user_id, org_id, label, now_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_device_token(&self, token_hash: &str) -> Result<Option<DeviceTokenRow>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_id, org_id, label, created_at, last_used_at, revoked_at
                FROM device_tokens
                WHERE token_hash = ?1
                "#,
                params![token_hash],
                row_to_device_token,
            )
            .optional()
            .map_err(crate::error::DbError::from)
    }

    pub fn touch_device_token(&self, token_hash: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE device_tokens SET last_used_at = ?2 WHERE token_hash = ?1",
            params![token_hash, now_rfc3339()],
        )?;
        Ok(())
    }

    pub fn revoke_device_token(&self, token_hash: &str) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE device_tokens
            SET revoked_at = ?2
            WHERE token_hash = ?1 AND revoked_at IS NULL
            "#,
            params![token_hash, now_rfc3339()],
        )?;
        Ok(changed > 0)
    }
}
