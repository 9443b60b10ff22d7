use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical per-user-per-day metrics record. One row per (user, date) in
/// the ledger; repeated submissions for a date replace the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub claude_sessions: u64,
    pub claude_messages: u64,
    pub claude_tokens: u64,
    pub claude_tool_calls: u64,
    pub git_commits: u64,
    pub git_lines_added: u64,
    pub git_lines_deleted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeDailyEntry {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sessions: u64,
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub tool_calls: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitDailyEntry {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub commits: u64,
    #[serde(default)]
    pub lines_added: u64,
    #[serde(default)]
    pub lines_deleted: u64,
}

/// Claude Code block of a collector submission. `totals` and `by_model`
/// ride along into the snapshot archive untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_model: Option<serde_json::Value>,
    #[serde(default)]
    pub daily: Vec<ClaudeDailyEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_repo: Option<serde_json::Value>,
    #[serde(default)]
    pub daily_array: Vec<GitDailyEntry>,
}

/// Raw payload POSTed by a collector agent. Either activity block may be
/// absent when the agent has nothing to report for that source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude: Option<ClaudeActivity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitActivity>,
}

impl SubmissionPayload {
    /// Grand totals used for the snapshot row, summed over every dated entry.
    pub fn totals(&self) -> (u64, u64) {
        let merged = normalize_submission(self);
        let tokens = merged.values().map(|m| m.claude_tokens).sum();
        let commits = merged.values().map(|m| m.git_commits).sum();
        (tokens, commits)
    }
}

/// Merge the Claude and Git daily arrays into one record per date.
///
/// Dates present in only one source keep zeros for the other source's
/// fields. Entries without a `date` are skipped; a malformed entry must
/// not abort the rest of the submission.
pub fn normalize_submission(payload: &SubmissionPayload) -> BTreeMap<String, DailyMetrics> {
    let mut merged: BTreeMap<String, DailyMetrics> = BTreeMap::new();
    if let Some(claude) = &payload.claude {
        for entry in &claude.daily {
            let Some(date) = &entry.date else {
                continue;
            };
            let record = merged.entry(date.clone()).or_default();
            record.claude_sessions += entry.sessions;
            record.claude_messages += entry.messages;
            record.claude_tokens += entry.tokens;
            record.claude_tool_calls += entry.tool_calls;
        }
    }
    if let Some(git) = &payload.git {
        for entry in &git.daily_array {
            let Some(date) = &entry.date else {
                continue;
            };
            let record = merged.entry(date.clone()).or_default();
            record.git_commits += entry.commits;
            record.git_lines_added += entry.lines_added;
            record.git_lines_deleted += entry.lines_deleted;
        }
    }
    merged
}

/// Period sums returned by `GET /api/metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub claude_sessions: u64,
    pub claude_messages: u64,
    pub claude_tokens: u64,
    pub claude_tool_calls: u64,
    pub git_commits: u64,
    pub git_lines_added: u64,
    pub git_lines_deleted: u64,
    pub reported_at: Option<String>,
}

/// One ranked row of a leaderboard query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub value: u64,
    pub reported_at: Option<String>,
}
