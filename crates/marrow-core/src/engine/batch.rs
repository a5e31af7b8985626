//! Batch mutations: all-or-nothing status sweeps and validated import.

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use crate::db::is_foreign_key_violation;
use crate::error::{EngineError, EngineResult};
use crate::model::Status;

/// Outcome of a successful [`bulk_set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkStatusReport {
    pub updated: usize,
}

/// Set one status across many issues, all or nothing.
///
/// Every id must exist; the first missing one aborts the whole batch with
/// its id and the transaction rolls back, leaving every row untouched.
/// Updated rows go through the same motions as a versioned update:
/// `version + 1`, fresh `updated_at_us`, and `resolved_at_us` stamped when
/// the new status is `CLOSED` (kept as-is otherwise). There is no
/// `expected_version` precondition, but the version bump means concurrent
/// versioned updaters see the sweep as a conflict instead of silently
/// losing to it.
///
/// # Errors
///
/// `IssueNotFound` carrying the first missing id.
pub fn bulk_set_status(
    conn: &mut Connection,
    issue_ids: &[i64],
    status: Status,
) -> EngineResult<BulkStatusReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now_us = Utc::now().timestamp_micros();
    let resolved_stamp = (status == Status::Closed).then_some(now_us);

    let mut updated = 0usize;
    for &issue_id in issue_ids {
        let n = tx.execute(
            "UPDATE issues SET status = ?1, version = version + 1, updated_at_us = ?2,
             resolved_at_us = COALESCE(?3, resolved_at_us) WHERE issue_id = ?4",
            params![status.as_str(), now_us, resolved_stamp, issue_id],
        )?;
        if n == 0 {
            return Err(EngineError::IssueNotFound(issue_id));
        }
        updated += 1;
    }

    tx.commit()?;
    Ok(BulkStatusReport { updated })
}

/// One not-yet-validated import record. All fields arrive as raw optional
/// strings; validation happens in [`import_issues`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawIssueRow {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

/// Outcome of [`import_issues`]: per-row diagnostics in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

struct StagedRow<'a> {
    row: usize,
    title: &'a str,
    description: Option<&'a str>,
    assignee_id: i64,
}

/// Import issue rows with per-row validation.
///
/// Validation requires `title` to be present (an empty string passes; the
/// check is presence, not content) and `assignee_id` to be present and
/// parse as an integer after trimming. A failing row is skipped, counted
/// in `failed`, and described in `errors` with its 1-based row number;
/// the remaining rows still go in. Every valid row is inserted `OPEN` at
/// version 1 inside one transaction, so a failure at insert time (an
/// assignee id that does not exist) rolls the whole batch back and no
/// report is produced.
///
/// # Errors
///
/// `Constraint` naming the offending row and assignee when a foreign key
/// rejects an insert; nothing is persisted in that case.
pub fn import_issues(conn: &mut Connection, rows: &[RawIssueRow]) -> EngineResult<ImportReport> {
    let mut report = ImportReport::default();
    let mut staged: Vec<StagedRow<'_>> = Vec::new();

    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 1;
        let Some(title) = raw.title.as_deref() else {
            report.failed += 1;
            report
                .errors
                .push(format!("row {row}: missing required field 'title'"));
            continue;
        };
        let Some(raw_assignee) = raw.assignee_id.as_deref() else {
            report.failed += 1;
            report
                .errors
                .push(format!("row {row}: missing required field 'assignee_id'"));
            continue;
        };
        let Ok(assignee_id) = raw_assignee.trim().parse::<i64>() else {
            report.failed += 1;
            report.errors.push(format!(
                "row {row}: invalid assignee_id '{raw_assignee}': expected an integer"
            ));
            continue;
        };
        staged.push(StagedRow {
            row,
            title,
            description: raw.description.as_deref(),
            assignee_id,
        });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now_us = Utc::now().timestamp_micros();
    for staged_row in &staged {
        let result = tx.execute(
            "INSERT INTO issues (title, description, status, assignee_id, version, created_at_us, updated_at_us)
             VALUES (?1, ?2, 'OPEN', ?3, 1, ?4, ?4)",
            params![
                staged_row.title,
                staged_row.description,
                staged_row.assignee_id,
                now_us,
            ],
        );
        if let Err(err) = result {
            if is_foreign_key_violation(&err) {
                return Err(EngineError::Constraint(format!(
                    "row {}: assignee {} does not exist; import rolled back",
                    staged_row.row, staged_row.assignee_id
                )));
            }
            return Err(err.into());
        }
    }
    tx.commit()?;

    report.created = staged.len();
    Ok(report)
}
