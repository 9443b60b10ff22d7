use chrono::{SecondsFormat, Utc};

use crate::error::Result;
use crate::period::Period;
use crate::services::{SharedConfig, SharedGate, open_db};
use pulse_core::{MetricsSummary, SubmissionPayload, normalize_submission};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub dates_written: usize,
    pub reported_at: String,
}

#[derive(Clone)]
pub struct MetricsService {
    config: SharedConfig,
    gate: SharedGate,
}

impl MetricsService {
    pub(super) fn new(config: SharedConfig, gate: SharedGate) -> Self {
        Self { config, gate }
    }

    /// Ingest one collector submission: resolve identity first (an
    /// unauthenticated payload is rejected before any write), normalize
    /// the daily arrays, replace each date's ledger row, and append one
    /// snapshot for audit. Each date's upsert is independently atomic, so
    /// a failed submission never corrupts previously stored dates and the
    /// collector can safely retry the whole payload.
    pub fn submit(&self, credential: &str, payload: &SubmissionPayload) -> Result<SubmitReceipt> {
        let identity = self.gate.resolve_submission(credential)?;
        let db = open_db(&self.config)?;

        if let Some(org_id) = &identity.org_id {
            db.upsert_org(org_id, identity.org_name.as_deref().unwrap_or(""))?;
            db.upsert_membership(&identity.user_id, org_id)?;
        }
        db.upsert_user(&identity.user_id, "", "", identity.org_id.as_deref())?;

        let merged = normalize_submission(payload);
        for (date, metrics) in &merged {
            db.upsert_daily(&identity.user_id, identity.org_id.as_deref(), date, metrics)?;
        }

        let reported_at = payload
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let (total_tokens, total_commits) = payload.totals();
        db.insert_snapshot(
            &identity.user_id,
            &reported_at,
            total_tokens,
            total_commits,
            &serde_json::to_string(payload)?,
        )?;

        Ok(SubmitReceipt {
            dates_written: merged.len(),
            reported_at,
        })
    }

    /// Period sums for the calling user, plus the last-synced timestamp
    /// from the snapshot archive.
    pub fn summary(&self, credential: &str, period: Period) -> Result<MetricsSummary> {
        let identity = self.gate.resolve_submission(credential)?;
        let db = open_db(&self.config)?;
        let totals = db.sum_by_user(&identity.user_id, &period.date_filter())?;
        let reported_at = db.latest_reported_at(&identity.user_id)?;
        Ok(MetricsSummary {
            claude_sessions: totals.claude_sessions,
            claude_messages: totals.claude_messages,
            claude_tokens: totals.claude_tokens,
            claude_tool_calls: totals.claude_tool_calls,
            git_commits: totals.git_commits,
            git_lines_added: totals.git_lines_added,
            git_lines_deleted: totals.git_lines_deleted,
            reported_at,
        })
    }
}
