//! Whole-set label reconciliation.

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use std::collections::HashSet;

use crate::db::is_unique_violation;
use crate::engine::create::ensure_issue_exists;
use crate::error::{EngineError, EngineResult};
use crate::model::Label;

/// Replace the full label set of an issue.
///
/// Duplicate names collapse; the returned labels keep first-occurrence
/// order. Labels missing from `names` are detached (their join rows
/// deleted); the Label rows themselves are never deleted. The whole
/// replacement is one transaction, so readers never observe the window
/// where the issue has no labels. Issue `version` is not touched.
///
/// # Errors
///
/// `IssueNotFound` when the issue does not exist; nothing is written.
pub fn set_issue_labels(
    conn: &mut Connection,
    issue_id: i64,
    names: &[String],
) -> EngineResult<Vec<Label>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_issue_exists(&tx, issue_id)?;

    let mut seen = HashSet::new();
    let mut distinct: Vec<&str> = Vec::new();
    for name in names {
        if seen.insert(name.as_str()) {
            distinct.push(name.as_str());
        }
    }

    // Full replacement: drop every current pairing, then re-attach.
    tx.execute(
        "DELETE FROM issue_labels WHERE issue_id = ?1",
        params![issue_id],
    )?;

    let mut labels = Vec::with_capacity(distinct.len());
    for name in distinct {
        let label = get_or_create_label(&tx, name)?;
        tx.execute(
            "INSERT INTO issue_labels (issue_id, label_id) VALUES (?1, ?2)",
            params![issue_id, label.id],
        )?;
        labels.push(label);
    }

    tx.commit()?;
    Ok(labels)
}

/// Fetch the label named `name`, creating it if absent. If the insert
/// loses a unique race, the winner's row is re-fetched.
fn get_or_create_label(tx: &Transaction<'_>, name: &str) -> EngineResult<Label> {
    if let Some(label) = lookup_label(tx, name)? {
        return Ok(label);
    }
    match tx.execute("INSERT INTO labels (name) VALUES (?1)", params![name]) {
        Ok(_) => Ok(Label {
            id: tx.last_insert_rowid(),
            name: name.to_string(),
        }),
        Err(err) if is_unique_violation(&err) => lookup_label(tx, name)?.ok_or_else(|| {
            EngineError::Constraint(format!("label '{name}' vanished after losing a unique race"))
        }),
        Err(err) => Err(err.into()),
    }
}

fn lookup_label(tx: &Transaction<'_>, name: &str) -> Result<Option<Label>, rusqlite::Error> {
    match tx.query_row(
        "SELECT label_id, name FROM labels WHERE name = ?1",
        params![name],
        |row| {
            Ok(Label {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    ) {
        Ok(label) => Ok(Some(label)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
