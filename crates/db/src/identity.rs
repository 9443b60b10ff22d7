use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use crate::Db;
use crate::error::Result;
use crate::types::{OrgRow, UserRow};

fn row_to_user(row: &Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        default_org_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Db {
    /// Insert or refresh a user profile. Non-empty name/email replace the
    /// stored values; empty strings leave the existing profile alone so a
    /// bare token resolution does not wipe a synced profile.
    pub fn upsert_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        default_org_id: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO users (id, name, email, default_org_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(id) DO UPDATE SET
              name = CASE WHEN excluded.name != '' THEN excluded.name ELSE users.name END,
              email = CASE WHEN excluded.email != '' THEN excluded.email ELSE users.email END,
              default_org_id = COALESCE(excluded.default_org_id, users.default_org_id),
              updated_at = excluded.updated_at
            "#,
            params![id, name, email, default_org_id, now],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, email, default_org_id, created_at, updated_at
                FROM users
                WHERE id = ?1
                "#,
                params![id],
                row_to_user,
            )
            .optional()
            .map_err(crate::error::DbError::from)
    }

    /// Create the org on first reference; refresh the display name when a
    /// non-empty one is supplied.
    pub fn upsert_org(&self, id: &str, name: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO orgs (id, name, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
              name = CASE WHEN excluded.name != '' THEN excluded.name ELSE orgs.name END
            "#,
            params![id, name, now],
        )?;
        Ok(())
    }

    pub fn get_org(&self, id: &str) -> Result<Option<OrgRow>> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM orgs WHERE id = ?1",
                params![id],
                |row| {
                    Ok(OrgRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(crate::error::DbError::from)
    }

    /// Record membership, keeping the original join date on repeats.
    pub fn upsert_membership(&self, user_id: &str, org_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO org_members (user_id, org_id, joined_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, org_id) DO NOTHING
            "#,
            params![user_id, org_id, now],
        )?;
        Ok(())
    }

    pub fn member_count(&self, org_id: &str) -> Result<u64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM org_members WHERE org_id = ?1",
                params![org_id],
                |row| row.get::<_, i64>(0),
            )
            .map(|value| value as u64)
            .map_err(crate::error::DbError::from)
    }

    /// Directory view used by the token gate: every user whose current
    /// default org is the given one.
    pub fn users_in_org(&self, org_id: &str) -> Result<Vec<UserRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, email, default_org_id, created_at, updated_at
            FROM users
            WHERE default_org_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![org_id], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
