//! Creation paths: users, issues, comments.

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior, params};

use crate::db::is_unique_violation;
use crate::error::{EngineError, EngineResult};
use crate::model::{Comment, Issue, NewIssue, Status, User};

/// Register a user. Email is unique store-wide.
///
/// # Errors
///
/// `Validation` for an empty name or a malformed email, `Constraint` when
/// the email is already registered.
pub fn create_user(conn: &mut Connection, name: &str, email: &str) -> EngineResult<User> {
    if name.trim().is_empty() {
        return Err(EngineError::Validation(
            "user name must not be empty".to_string(),
        ));
    }
    if email.trim().is_empty() || !email.contains('@') {
        return Err(EngineError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if let Err(err) = tx.execute(
        "INSERT INTO users (name, email) VALUES (?1, ?2)",
        params![name, email],
    ) {
        if is_unique_violation(&err) {
            return Err(EngineError::Constraint(format!(
                "email '{email}' is already registered"
            )));
        }
        return Err(err.into());
    }
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    })
}

/// Create an issue at version 1.
///
/// `created_at_us` and `updated_at_us` start equal; `resolved_at_us` is
/// stamped right away if the issue is created already `CLOSED`.
///
/// # Errors
///
/// `UserNotFound` when the assignee does not exist.
pub fn create_issue(conn: &mut Connection, new: &NewIssue) -> EngineResult<Issue> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if let Some(assignee_id) = new.assignee_id {
        ensure_user_exists(&tx, assignee_id)?;
    }

    let now_us = Utc::now().timestamp_micros();
    let resolved_at_us = (new.status == Status::Closed).then_some(now_us);
    tx.execute(
        "INSERT INTO issues (title, description, status, assignee_id, version, created_at_us, updated_at_us, resolved_at_us)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5, ?6)",
        params![
            new.title,
            new.description,
            new.status.as_str(),
            new.assignee_id,
            now_us,
            resolved_at_us,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(Issue {
        id,
        title: new.title.clone(),
        description: new.description.clone(),
        status: new.status,
        assignee_id: new.assignee_id,
        version: 1,
        created_at_us: now_us,
        updated_at_us: now_us,
        resolved_at_us,
    })
}

/// Attach a comment to an issue. Comments are immutable once written.
///
/// # Errors
///
/// `Validation` for a blank body, `IssueNotFound` / `UserNotFound` for
/// dangling references.
pub fn add_comment(
    conn: &mut Connection,
    issue_id: i64,
    author_id: i64,
    body: &str,
) -> EngineResult<Comment> {
    if body.trim().is_empty() {
        return Err(EngineError::Validation(
            "comment body must not be empty".to_string(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_issue_exists(&tx, issue_id)?;
    ensure_user_exists(&tx, author_id)?;

    let now_us = Utc::now().timestamp_micros();
    tx.execute(
        "INSERT INTO comments (issue_id, author_id, body, created_at_us) VALUES (?1, ?2, ?3, ?4)",
        params![issue_id, author_id, body, now_us],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(Comment {
        id,
        issue_id,
        author_id,
        body: body.to_string(),
        created_at_us: now_us,
    })
}

pub(crate) fn ensure_issue_exists(tx: &Transaction<'_>, issue_id: i64) -> EngineResult<()> {
    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM issues WHERE issue_id = ?1)",
        [issue_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(EngineError::IssueNotFound(issue_id))
    }
}

pub(crate) fn ensure_user_exists(tx: &Transaction<'_>, user_id: i64) -> EngineResult<()> {
    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
        [user_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(EngineError::UserNotFound(user_id))
    }
}
