use crate::error::{AppError, Result};
use crate::period::Period;
use crate::services::{SharedConfig, SharedGate, open_db};
use pulse_core::LeaderboardEntry;
use pulse_db::{Db, Metric};

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Org,
    Global,
}

impl Scope {
    pub fn parse(token: Option<&str>) -> Result<Self> {
        match token.unwrap_or("org") {
            "org" => Ok(Scope::Org),
            "global" => Ok(Scope::Global),
            value => Err(AppError::InvalidInput(format!(
                "unsupported scope {}",
                value
            ))),
        }
    }
}

/// Metric tokens outside the allow-list coerce to the default rather than
/// erroring, mirroring the period fallback.
pub fn parse_metric(token: Option<&str>) -> Metric {
    match token.unwrap_or("claude_tokens") {
        "claude_messages" => Metric::ClaudeMessages,
        "git_commits" => Metric::GitCommits,
        "git_lines_added" => Metric::GitLinesAdded,
        _ => Metric::ClaudeTokens,
    }
}

#[derive(Clone)]
pub struct LeaderboardService {
    config: SharedConfig,
    gate: SharedGate,
}

impl LeaderboardService {
    pub(super) fn new(config: SharedConfig, gate: SharedGate) -> Self {
        Self { config, gate }
    }

    pub fn leaderboard(
        &self,
        scope: Scope,
        org_id: Option<&str>,
        metric: Metric,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let filter = period.date_filter();
        let db = open_db(&self.config)?;
        let sums = match scope {
            Scope::Org => {
                let org_id = org_id.ok_or_else(|| {
                    AppError::InvalidInput("org scope requires an org".to_string())
                })?;
                if db.get_org(org_id)?.is_none() {
                    return Err(AppError::NotFound(format!("unknown org {}", org_id)));
                }
                // Best effort: newly added members should appear with
                // zero values. Stale membership is acceptable when the
                // identity source is down, so failure only logs.
                if let Err(err) = self.sync_org_members(&db, org_id) {
                    tracing::warn!(
                        org_id,
                        error = %err,
                        "membership sync failed, ranking with existing members"
                    );
                }
                db.sum_by_org_members(org_id, metric, &filter, limit)?
            }
            Scope::Global => db.sum_global(metric, &filter, limit)?,
        };
        Ok(sums
            .into_iter()
            .map(|row| LeaderboardEntry {
                id: row.user_id,
                name: row.name,
                email: row.email,
                value: row.value,
                reported_at: row.reported_at,
            })
            .collect())
    }

    /// Leaderboard for an authenticated caller: org scope ranks the
    /// caller's own org.
    pub fn leaderboard_for_caller(
        &self,
        credential: &str,
        scope: Scope,
        metric: Metric,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let identity = self.gate.resolve_submission(credential)?;
        match scope {
            Scope::Org => {
                let org_id = identity.org_id.ok_or_else(|| {
                    AppError::InvalidInput("caller is not linked to an org".to_string())
                })?;
                self.leaderboard(Scope::Org, Some(&org_id), metric, period, limit)
            }
            Scope::Global => self.leaderboard(Scope::Global, None, metric, period, limit),
        }
    }

    fn sync_org_members(&self, db: &Db, org_id: &str) -> Result<()> {
        let members = self.gate.list_org_members(org_id)?;
        for member in members {
            db.upsert_user(&member.user_id, &member.name, &member.email, Some(org_id))?;
            db.upsert_membership(&member.user_id, org_id)?;
        }
        Ok(())
    }
}
