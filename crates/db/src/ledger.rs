use chrono::{SecondsFormat, Utc};
use pulse_core::DailyMetrics;
use rusqlite::params;

use crate::Db;
use crate::error::Result;
use crate::types::{DateFilter, MemberSum, Metric};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Db {
    /// Replace the ledger row for (user, date) with the submitted values.
    ///
    /// Collectors report rolling per-date totals, not deltas, so a repeat
    /// submission overwrites every metric column. Single statement, atomic
    /// per date; racing submissions resolve to whichever commits last.
    pub fn upsert_daily(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        date: &str,
        metrics: &DailyMetrics,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO daily_metrics (
              user_id, date, org_id, claude_sessions, claude_messages, claude_tokens,
              claude_tool_calls, git_commits, git_lines_added, git_lines_deleted, updated_at
            ) VALUES (
              ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11
            )
            ON CONFLICT(user_id, date) DO UPDATE SET
              org_id = excluded.org_id,
              claude_sessions = excluded.claude_sessions,
              claude_messages = excluded.claude_messages,
              claude_tokens = excluded.claude_tokens,
              claude_tool_calls = excluded.claude_tool_calls,
              git_commits = excluded.git_commits,
              git_lines_added = excluded.git_lines_added,
              git_lines_deleted = excluded.git_lines_deleted,
              updated_at = excluded.updated_at
            "#,
            params![
                user_id,
                date,
                org_id,
                metrics.claude_sessions as i64,
                metrics.claude_messages as i64,
                metrics.claude_tokens as i64,
                metrics.claude_tool_calls as i64,
                metrics.git_commits as i64,
                metrics.git_lines_added as i64,
                metrics.git_lines_deleted as i64,
                now_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Sum every metric column over one user's rows matching the filter.
    pub fn sum_by_user(&self, user_id: &str, filter: &DateFilter) -> Result<DailyMetrics> {
        let mut sql = String::from(
            r#"
            SELECT COALESCE(SUM(claude_sessions), 0), COALESCE(SUM(claude_messages), 0),
                   COALESCE(SUM(claude_tokens), 0), COALESCE(SUM(claude_tool_calls), 0),
                   COALESCE(SUM(git_commits), 0), COALESCE(SUM(git_lines_added), 0),
                   COALESCE(SUM(git_lines_deleted), 0)
            FROM daily_metrics
            WHERE user_id = ?1
            "#,
        );
        if let Some(op) = filter.op() {
            sql.push_str(&format!(" AND date {} ?2", op));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(DailyMetrics {
                claude_sessions: row.get::<_, i64>(0)? as u64,
                claude_messages: row.get::<_, i64>(1)? as u64,
                claude_tokens: row.get::<_, i64>(2)? as u64,
                claude_tool_calls: row.get::<_, i64>(3)? as u64,
                git_commits: row.get::<_, i64>(4)? as u64,
                git_lines_added: row.get::<_, i64>(5)? as u64,
                git_lines_deleted: row.get::<_, i64>(6)? as u64,
            })
        };
        let totals = if let Some(date) = filter.date() {
            stmt.query_row(params![user_id, date], map_row)?
        } else {
            stmt.query_row(params![user_id], map_row)?
        };
        Ok(totals)
    }

    /// Ranked sums for every member of an org, zero-filled for members
    /// without ledger rows in range. Membership comes from `org_members`,
    /// not from ledger presence, so inactive members still appear.
    pub fn sum_by_org_members(
        &self,
        org_id: &str,
        metric: Metric,
        filter: &DateFilter,
        limit: u32,
    ) -> Result<Vec<MemberSum>> {
        let mut join = String::from("d.user_id = u.id");
        if let Some(op) = filter.op() {
            join.push_str(&format!(" AND d.date {} ?3", op));
        }
        let sql = format!(
            r#"
            SELECT u.id, u.name, u.email,
                   COALESCE(SUM(d.{column}), 0) AS value,
                   MAX(d.updated_at)
            FROM org_members m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN daily_metrics d ON {join}
            WHERE m.org_id = ?1
            GROUP BY u.id, u.name, u.email
            ORDER BY value DESC, u.id ASC
            LIMIT ?2
            "#,
            column = metric.column(),
            join = join,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = if let Some(date) = filter.date() {
            stmt.query(params![org_id, limit, date])?
        } else {
            stmt.query(params![org_id, limit])?
        };
        let mut sums = Vec::new();
        while let Some(row) = rows.next()? {
            sums.push(MemberSum {
                user_id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                value: row.get::<_, i64>(3)?.max(0) as u64,
                reported_at: row.get(4)?,
            });
        }
        Ok(sums)
    }

    /// Ranked sums over every user in the system. Users whose sum is
    /// exactly zero are excluded; the global board only shows activity.
    pub fn sum_global(
        &self,
        metric: Metric,
        filter: &DateFilter,
        limit: u32,
    ) -> Result<Vec<MemberSum>> {
        let mut join = String::from("d.user_id = u.id");
        if let Some(op) = filter.op() {
            join.push_str(&format!(" AND d.date {} ?2", op));
        }
        let sql = format!(
            r#"
            SELECT u.id, u.name, u.email,
                   COALESCE(SUM(d.{column}), 0) AS value,
                   MAX(d.updated_at)
            FROM users u
            LEFT JOIN daily_metrics d ON {join}
            GROUP BY u.id, u.name, u.email
            HAVING value > 0
            ORDER BY value DESC, u.id ASC
            LIMIT ?1
            "#,
            column = metric.column(),
            join = join,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = if let Some(date) = filter.date() {
            stmt.query(params![limit, date])?
        } else {
            stmt.query(params![limit])?
        };
        let mut sums = Vec::new();
        while let Some(row) = rows.next()? {
            sums.push(MemberSum {
                user_id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                value: row.get::<_, i64>(3)?.max(0) as u64,
                reported_at: row.get(4)?,
            });
        }
        Ok(sums)
    }
}
