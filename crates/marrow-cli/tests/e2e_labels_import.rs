//! E2E tests for label reconciliation, bulk status sweeps, JSONL import,
//! and project stats.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn mw_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mw"));
    cmd.current_dir(dir);
    cmd.env("MARROW_LOG", "error");
    cmd
}

fn init_project(dir: &Path) {
    mw_cmd(dir).args(["init"]).assert().success();
}

fn create_issue(dir: &Path, title: &str) -> i64 {
    let output = mw_cmd(dir)
        .args(["create", "--title", title, "--json"])
        .output()
        .expect("create should not crash");
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json["id"].as_i64().expect("id field")
}

fn create_user(dir: &Path, name: &str, email: &str) -> i64 {
    let output = mw_cmd(dir)
        .args(["user", "add", "--name", name, "--email", email, "--json"])
        .output()
        .expect("user add should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_i64().expect("id field")
}

fn show_issue_json(dir: &Path, id: i64) -> Value {
    let output = mw_cmd(dir)
        .args(["show", &id.to_string(), "--json"])
        .output()
        .expect("show should not crash");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn issue_labels(dir: &Path, id: i64) -> Vec<String> {
    show_issue_json(dir, id)["labels"]
        .as_array()
        .expect("labels array")
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

fn label_ls_json(dir: &Path) -> Vec<Value> {
    let output = mw_cmd(dir)
        .args(["label", "ls", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    json.as_array().cloned().expect("label ls --json is an array")
}

// ===========================================================================
// Label reconciliation
// ===========================================================================

#[test]
fn label_set_collapses_duplicates_in_first_seen_order() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = create_issue(dir.path(), "Labelled");

    let output = mw_cmd(dir.path())
        .args(["label", "set", &id.to_string(), "bug", "bug", "urgent", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["labels"], serde_json::json!(["bug", "urgent"]));

    assert_eq!(issue_labels(dir.path(), id), vec!["bug", "urgent"]);
}

#[test]
fn label_set_replaces_the_whole_set() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = create_issue(dir.path(), "Relabelled");
    let id_str = id.to_string();

    mw_cmd(dir.path())
        .args(["label", "set", &id_str, "bug", "urgent"])
        .assert()
        .success();
    mw_cmd(dir.path())
        .args(["label", "set", &id_str, "urgent"])
        .assert()
        .success();

    assert_eq!(issue_labels(dir.path(), id), vec!["urgent"]);

    // The detached label survives in the catalog at zero issues.
    let labels = label_ls_json(dir.path());
    let bug = labels
        .iter()
        .find(|l| l["name"] == "bug")
        .expect("bug label must still exist");
    assert_eq!(bug["issues"], 0);
}

#[test]
fn label_set_with_no_names_clears() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = create_issue(dir.path(), "Cleared");
    let id_str = id.to_string();

    mw_cmd(dir.path())
        .args(["label", "set", &id_str, "bug"])
        .assert()
        .success();
    mw_cmd(dir.path())
        .args(["label", "set", &id_str])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared labels"));

    assert!(issue_labels(dir.path(), id).is_empty());
}

#[test]
fn label_set_leaves_version_alone() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = create_issue(dir.path(), "Metadata only");

    mw_cmd(dir.path())
        .args(["label", "set", &id.to_string(), "bug"])
        .assert()
        .success();

    let issue = show_issue_json(dir.path(), id);
    assert_eq!(issue["version"], 1, "labels are not versioned content");
}

#[test]
fn label_set_on_missing_issue_fails() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    mw_cmd(dir.path())
        .args(["label", "set", "404", "bug"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue 404 not found"));
}

#[test]
fn labels_shared_across_issues_count_correctly() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let a = create_issue(dir.path(), "first");
    let b = create_issue(dir.path(), "second");

    mw_cmd(dir.path())
        .args(["label", "set", &a.to_string(), "bug"])
        .assert()
        .success();
    mw_cmd(dir.path())
        .args(["label", "set", &b.to_string(), "bug", "urgent"])
        .assert()
        .success();

    let labels = label_ls_json(dir.path());
    let bug = labels.iter().find(|l| l["name"] == "bug").unwrap();
    assert_eq!(bug["issues"], 2);

    let filtered = mw_cmd(dir.path())
        .args(["list", "--label", "urgent", "--json"])
        .output()
        .unwrap();
    let issues: Vec<Value> = serde_json::from_slice(&filtered.stdout).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["id"], b);
}

// ===========================================================================
// Bulk status
// ===========================================================================

#[test]
fn bulk_close_updates_every_issue() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let a = create_issue(dir.path(), "a");
    let b = create_issue(dir.path(), "b");

    let output = mw_cmd(dir.path())
        .args(["status", "closed", &a.to_string(), &b.to_string(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["updated"], 2);

    for id in [a, b] {
        let issue = show_issue_json(dir.path(), id);
        assert_eq!(issue["status"], "CLOSED");
        assert_eq!(issue["version"], 2);
        assert!(issue.get("resolved_at_us").is_some());
    }
}

#[test]
fn bulk_status_with_a_missing_id_changes_nothing() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let a = create_issue(dir.path(), "a");
    let b = create_issue(dir.path(), "b");

    mw_cmd(dir.path())
        .args(["status", "closed", &a.to_string(), "404", &b.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue 404 not found"));

    for id in [a, b] {
        let issue = show_issue_json(dir.path(), id);
        assert_eq!(issue["status"], "OPEN");
        assert_eq!(issue["version"], 1);
    }
}

#[test]
fn bulk_sweep_conflicts_with_stale_clients() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = create_issue(dir.path(), "swept");

    mw_cmd(dir.path())
        .args(["status", "in-progress", &id.to_string()])
        .assert()
        .success();

    // A client still holding version 1 must now conflict.
    mw_cmd(dir.path())
        .args(["update", &id.to_string(), "--expect-version", "1", "--title", "late"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("version conflict"));
}

// ===========================================================================
// Import
// ===========================================================================

#[test]
fn import_reports_good_and_bad_rows() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let uid = create_user(dir.path(), "ada", "ada@example.com");

    let jsonl = format!(
        "{{\"title\": \"first\", \"assignee_id\": \"{uid}\"}}\n\
         {{\"assignee_id\": \"{uid}\"}}\n\
         {{\"title\": \"third\", \"description\": \"detail\", \"assignee_id\": \"{uid}\"}}\n"
    );
    let file = dir.path().join("issues.jsonl");
    std::fs::write(&file, jsonl).unwrap();

    let output = mw_cmd(dir.path())
        .args(["import", file.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["created"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["skipped_invalid"], 0);
    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().starts_with("row 2:"));

    let listed = mw_cmd(dir.path()).args(["list", "--json"]).output().unwrap();
    let issues: Vec<Value> = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(issues.len(), 2);
    for issue in &issues {
        assert_eq!(issue["status"], "OPEN");
        assert_eq!(issue["version"], 1);
        assert_eq!(issue["assignee_id"], uid);
    }
}

#[test]
fn import_with_unknown_assignee_rolls_back_everything() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let uid = create_user(dir.path(), "ada", "ada@example.com");

    let jsonl = format!(
        "{{\"title\": \"good\", \"assignee_id\": \"{uid}\"}}\n\
         {{\"title\": \"dangling\", \"assignee_id\": \"999\"}}\n"
    );
    let file = dir.path().join("issues.jsonl");
    std::fs::write(&file, jsonl).unwrap();

    mw_cmd(dir.path())
        .args(["import", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 2"))
        .stderr(predicate::str::contains("999"));

    let listed = mw_cmd(dir.path()).args(["list", "--json"]).output().unwrap();
    let issues: Vec<Value> = serde_json::from_slice(&listed.stdout).unwrap();
    assert!(issues.is_empty(), "rollback must discard the good row too");
}

#[test]
fn import_skips_unparseable_lines_but_keeps_going() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let uid = create_user(dir.path(), "ada", "ada@example.com");

    let jsonl = format!(
        "{{\"title\": \"kept\", \"assignee_id\": \"{uid}\"}}\n\
         this line is not json\n\
         \n\
         {{\"title\": \"also kept\", \"assignee_id\": \"{uid}\"}}\n"
    );
    let file = dir.path().join("issues.jsonl");
    std::fs::write(&file, jsonl).unwrap();

    let output = mw_cmd(dir.path())
        .args(["import", file.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["created"], 2);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["skipped_invalid"], 1, "blank lines do not count");
}

#[test]
fn import_missing_file_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    mw_cmd(dir.path())
        .args(["import", "no-such-file.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-file.jsonl"));
}

// ===========================================================================
// Stats
// ===========================================================================

#[test]
fn stats_on_empty_project() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let output = mw_cmd(dir.path()).args(["stats", "--json"]).output().unwrap();
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["resolved"], 0);
    assert!(
        stats.get("avg_resolution_seconds").is_none(),
        "no latency without resolved issues"
    );
}

#[test]
fn stats_reflect_status_counts_and_latency() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    create_issue(dir.path(), "open one");
    create_issue(dir.path(), "open two");
    let closed = create_issue(dir.path(), "done");

    mw_cmd(dir.path())
        .args(["status", "closed", &closed.to_string()])
        .assert()
        .success();

    let output = mw_cmd(dir.path()).args(["stats", "--json"]).output().unwrap();
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["by_status"]["OPEN"], 2);
    assert_eq!(stats["by_status"]["CLOSED"], 1);
    assert_eq!(stats["resolved"], 1);
    let avg = stats["avg_resolution_seconds"]
        .as_f64()
        .expect("latency present once something resolved");
    assert!(avg >= 0.0);

    mw_cmd(dir.path())
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project stats"))
        .stdout(predicate::str::contains("resolved"));
}
