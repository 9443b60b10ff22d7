#![allow(dead_code)]

use std::path::PathBuf;

use pulse_core::DailyMetrics;
use pulse_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn add_user(db: &Db, id: &str, org_id: &str) {
    db.upsert_org(org_id, &format!("{org_id} name")).expect("org");
    db.upsert_user(id, &format!("{id} name"), &format!("{id}@example.com"), Some(org_id))
        .expect("user");
}

pub fn add_member(db: &Db, user_id: &str, org_id: &str) {
    db.upsert_membership(user_id, org_id).expect("membership");
}

pub fn tokens_only(tokens: u64) -> DailyMetrics {
    DailyMetrics {
        claude_tokens: tokens,
        ..Default::default()
    }
}

pub fn make_metrics(tokens: u64, messages: u64, commits: u64) -> DailyMetrics {
    DailyMetrics {
        claude_sessions: 1,
        claude_messages: messages,
        claude_tokens: tokens,
        claude_tool_calls: messages * 2,
        git_commits: commits,
        git_lines_added: commits * 10,
        git_lines_deleted: commits * 3,
    }
}
