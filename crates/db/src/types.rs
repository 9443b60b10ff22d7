/// Metrics a leaderboard can rank by. Kept as a closed enum so caller
/// input never reaches SQL as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    ClaudeTokens,
    ClaudeMessages,
    GitCommits,
    GitLinesAdded,
}

impl Metric {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Metric::ClaudeTokens => "claude_tokens",
            Metric::ClaudeMessages => "claude_messages",
            Metric::GitCommits => "git_commits",
            Metric::GitLinesAdded => "git_lines_added",
        }
    }
}

/// Date predicate applied when summing ledger rows. Dates are `YYYY-MM-DD`
/// strings, so lexicographic comparison matches chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFilter {
    On(String),
    Since(String),
    All,
}

impl DateFilter {
    /// SQL comparison operator for the filter, `None` when unfiltered.
    pub(crate) fn op(&self) -> Option<&'static str> {
        match self {
            DateFilter::On(_) => Some("="),
            DateFilter::Since(_) => Some(">="),
            DateFilter::All => None,
        }
    }

    pub(crate) fn date(&self) -> Option<&str> {
        match self {
            DateFilter::On(date) | DateFilter::Since(date) => Some(date),
            DateFilter::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub default_org_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// One row of a ranked sum query: a user plus their summed metric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSum {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub value: u64,
    pub reported_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTokenRow {
    pub id: i64,
    pub user_id: String,
    pub org_id: Option<String>,
    pub label: Option<String>,
    pub created_at: String,
    pub last_used_at: Option<String>,
    pub revoked_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingCodeRow {
    pub code: String,
    pub user_id: String,
    pub org_id: Option<String>,
    pub created_at: String,
    pub expires_at: String,
    pub used_at: Option<String>,
}
