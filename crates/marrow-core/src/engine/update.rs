//! Versioned issue updates.

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior, params};

use crate::db::query::{ISSUE_COLUMNS, row_to_issue};
use crate::error::{EngineError, EngineResult};
use crate::model::{Issue, IssuePatch, Status};

/// Apply `patch` to an issue under optimistic concurrency.
///
/// The stored `version` must equal `expected_version` or nothing changes.
/// On success the version is incremented by exactly one (an empty patch
/// still counts as a mutation), `updated_at_us` is stamped, and when the
/// resulting status is `CLOSED`, `resolved_at_us` is stamped too. That
/// stamp is unconditional: re-closing an already-closed issue moves
/// `resolved_at_us` forward, and reopening leaves the old stamp in place.
///
/// # Errors
///
/// `IssueNotFound` when the id has no row, `VersionConflict` when the
/// stored version differs from `expected_version`. Either way the row is
/// left byte-for-byte as it was.
pub fn update_issue(
    conn: &mut Connection,
    issue_id: i64,
    patch: &IssuePatch,
    expected_version: i64,
) -> EngineResult<Issue> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // 1. Load the current row inside the transaction.
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE issue_id = ?1");
    let current = match tx.query_row(&sql, [issue_id], row_to_issue) {
        Ok(issue) => issue,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(EngineError::IssueNotFound(issue_id));
        }
        Err(e) => return Err(e.into()),
    };

    // 2. Check the precondition before touching anything.
    if current.version != expected_version {
        return Err(EngineError::VersionConflict {
            issue_id,
            expected: expected_version,
            actual: current.version,
        });
    }

    // 3. Fold the patch over the stored fields. A `None` field stays as it
    //    was; `Some(None)` on description clears it.
    let title = patch.title.clone().unwrap_or(current.title);
    let description = match &patch.description {
        Some(description) => description.clone(),
        None => current.description,
    };
    let status = patch.status.unwrap_or(current.status);

    let now_us = Utc::now().timestamp_micros();
    let version = current.version + 1;
    let resolved_at_us = if status == Status::Closed {
        Some(now_us)
    } else {
        current.resolved_at_us
    };

    tx.execute(
        "UPDATE issues SET title = ?1, description = ?2, status = ?3, version = ?4,
         updated_at_us = ?5, resolved_at_us = ?6 WHERE issue_id = ?7",
        params![
            title,
            description,
            status.as_str(),
            version,
            now_us,
            resolved_at_us,
            issue_id,
        ],
    )?;
    tx.commit()?;

    Ok(Issue {
        id: issue_id,
        title,
        description,
        status,
        assignee_id: current.assignee_id,
        version,
        created_at_us: current.created_at_us,
        updated_at_us: now_us,
        resolved_at_us,
    })
}
