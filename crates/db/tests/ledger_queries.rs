mod support;

use pulse_db::DateFilter;
use support::{add_user, make_metrics, setup_db, tokens_only};

#[test]
fn resubmitting_a_date_replaces_the_row() {
    let test_db = setup_db();
    let db = &test_db.db;
    add_user(db, "u1", "org-x");

    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &make_metrics(100, 5, 0))
        .expect("first upsert");
    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &make_metrics(50, 2, 0))
        .expect("second upsert");

    let totals = db.sum_by_user("u1", &DateFilter::All).expect("sum");
    assert_eq!(totals.claude_tokens, 50);
    assert_eq!(totals.claude_messages, 2);
}

#[test]
fn upsert_is_idempotent_for_identical_payloads() {
    let test_db = setup_db();
    let db = &test_db.db;
    add_user(db, "u1", "org-x");

    let metrics = make_metrics(120, 4, 2);
    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &metrics)
        .expect("first upsert");
    let once = db.sum_by_user("u1", &DateFilter::All).expect("sum once");

    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &metrics)
        .expect("second upsert");
    let twice = db.sum_by_user("u1", &DateFilter::All).expect("sum twice");

    assert_eq!(once, twice);
}

#[test]
fn distinct_dates_accumulate_in_sums() {
    let test_db = setup_db();
    let db = &test_db.db;
    add_user(db, "u1", "org-x");

    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &make_metrics(100, 5, 1))
        .expect("day one");
    db.upsert_daily("u1", Some("org-x"), "2024-01-02", &make_metrics(40, 1, 2))
        .expect("day two");

    let totals = db.sum_by_user("u1", &DateFilter::All).expect("sum");
    assert_eq!(totals.claude_tokens, 140);
    assert_eq!(totals.claude_messages, 6);
    assert_eq!(totals.git_commits, 3);
    assert_eq!(totals.git_lines_added, 30);
}

#[test]
fn date_filters_restrict_sums() {
    let test_db = setup_db();
    let db = &test_db.db;
    add_user(db, "u1", "org-x");

    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &tokens_only(10))
        .expect("old day");
    db.upsert_daily("u1", Some("org-x"), "2024-02-01", &tokens_only(20))
        .expect("mid day");
    db.upsert_daily("u1", Some("org-x"), "2024-03-01", &tokens_only(40))
        .expect("new day");

    let on = db
        .sum_by_user("u1", &DateFilter::On("2024-02-01".to_string()))
        .expect("on filter");
    assert_eq!(on.claude_tokens, 20);

    let since = db
        .sum_by_user("u1", &DateFilter::Since("2024-02-01".to_string()))
        .expect("since filter");
    assert_eq!(since.claude_tokens, 60);

    let all = db.sum_by_user("u1", &DateFilter::All).expect("all filter");
    assert_eq!(all.claude_tokens, 70);
    assert!(all.claude_tokens >= since.claude_tokens);
    assert!(since.claude_tokens >= on.claude_tokens);
}

#[test]
fn sums_for_unknown_user_are_zero() {
    let test_db = setup_db();
    let totals = test_db
        .db
        .sum_by_user("nobody", &DateFilter::All)
        .expect("sum");
    assert_eq!(totals, Default::default());
}

#[test]
fn org_attribution_is_last_writer_wins() {
    let test_db = setup_db();
    let db = &test_db.db;
    add_user(db, "u1", "org-x");

    db.upsert_daily("u1", Some("org-x"), "2024-01-01", &tokens_only(10))
        .expect("first org");
    db.upsert_daily("u1", Some("org-y"), "2024-01-01", &tokens_only(10))
        .expect("second org");

    // The row stays unique per (user, date); only attribution moved.
    let totals = db.sum_by_user("u1", &DateFilter::All).expect("sum");
    assert_eq!(totals.claude_tokens, 10);
}

#[test]
fn snapshots_append_and_expose_latest() {
    let test_db = setup_db();
    let db = &test_db.db;
    add_user(db, "u1", "org-x");

    assert_eq!(db.latest_reported_at("u1").expect("empty"), None);

    db.insert_snapshot("u1", "2024-01-01T10:00:00Z", 100, 2, "{}")
        .expect("first snapshot");
    db.insert_snapshot("u1", "2024-01-01T10:30:00Z", 150, 3, "{}")
        .expect("second snapshot");

    assert_eq!(db.snapshot_count("u1").expect("count"), 2);
    assert_eq!(
        db.latest_reported_at("u1").expect("latest").as_deref(),
        Some("2024-01-01T10:30:00Z")
    );
}
