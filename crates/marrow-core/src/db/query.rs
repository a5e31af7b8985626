//! Read-only queries against the store.
//!
//! Everything here takes a plain `&Connection`; writes live in
//! [`crate::engine`]. Missing single entities are `Ok(None)`, not errors.

use anyhow::{Result, bail};
use rusqlite::{Connection, Row, ToSql, params_from_iter};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::model::{Comment, Issue, Label, Status, User};

/// Column list every issue query selects, in the order
/// [`row_to_issue`] reads them.
pub(crate) const ISSUE_COLUMNS: &str =
    "issue_id, title, description, status, assignee_id, version, created_at_us, updated_at_us, resolved_at_us";

pub(crate) fn row_to_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let status_raw: String = row.get(3)?;
    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: super::status_from_column(3, &status_raw)?,
        assignee_id: row.get(4)?,
        version: row.get(5)?,
        created_at_us: row.get(6)?,
        updated_at_us: row.get(7)?,
        resolved_at_us: row.get(8)?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        author_id: row.get(2)?,
        body: row.get(3)?,
        created_at_us: row.get(4)?,
    })
}

fn row_to_label(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Sort orders accepted by issue listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    CreatedDesc,
    CreatedAsc,
}

impl SortOrder {
    #[must_use]
    pub const fn sql_clause(self) -> &'static str {
        match self {
            Self::UpdatedDesc => "ORDER BY updated_at_us DESC, issue_id DESC",
            Self::UpdatedAsc => "ORDER BY updated_at_us ASC, issue_id ASC",
            Self::CreatedDesc => "ORDER BY created_at_us DESC, issue_id DESC",
            Self::CreatedAsc => "ORDER BY created_at_us ASC, issue_id ASC",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::UpdatedDesc => "updated-desc",
            Self::UpdatedAsc => "updated-asc",
            Self::CreatedDesc => "created-desc",
            Self::CreatedAsc => "created-asc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "updated-desc" => Ok(Self::UpdatedDesc),
            "updated-asc" => Ok(Self::UpdatedAsc),
            "created-desc" => Ok(Self::CreatedDesc),
            "created-asc" => Ok(Self::CreatedAsc),
            other => bail!(
                "unknown sort order '{other}' (expected updated-desc, updated-asc, created-desc, or created-asc)"
            ),
        }
    }
}

/// Filters for listing issues. Conditions combine with AND.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub assignee_id: Option<i64>,
    /// Exact label name the issue must carry.
    pub label: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: SortOrder,
}

fn filter_conditions(filter: &IssueFilter) -> (Vec<String>, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        param_values.push(Box::new(status.as_str()));
        conditions.push(format!("status = ?{}", param_values.len()));
    }
    if let Some(assignee_id) = filter.assignee_id {
        param_values.push(Box::new(assignee_id));
        conditions.push(format!("assignee_id = ?{}", param_values.len()));
    }
    if let Some(label) = &filter.label {
        param_values.push(Box::new(label.clone()));
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM issue_labels il \
             JOIN labels l ON l.label_id = il.label_id \
             WHERE il.issue_id = issues.issue_id AND l.name = ?{})",
            param_values.len()
        ));
    }

    (conditions, param_values)
}

fn limit_clause(limit: Option<u32>, offset: Option<u32>) -> String {
    match (limit, offset) {
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        // SQLite requires a LIMIT before OFFSET; -1 means unlimited.
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        (None, None) => String::new(),
    }
}

/// Fetch one issue by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_issue(conn: &Connection, issue_id: i64) -> Result<Option<Issue>> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE issue_id = ?1");
    match conn.query_row(&sql, [issue_id], row_to_issue) {
        Ok(issue) => Ok(Some(issue)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn issue_exists(conn: &Connection, issue_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM issues WHERE issue_id = ?1)",
        [issue_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// List issues matching `filter`, in the filter's sort order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_issues(conn: &Connection, filter: &IssueFilter) -> Result<Vec<Issue>> {
    let (conditions, param_values) = filter_conditions(filter);

    let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues");
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push(' ');
    sql.push_str(filter.sort.sql_clause());
    sql.push_str(&limit_clause(filter.limit, filter.offset));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(param_values), row_to_issue)?;
    let mut issues = Vec::new();
    for row in rows {
        issues.push(row?);
    }
    Ok(issues)
}

/// Total number of issues in the store.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_issues(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
    Ok(count)
}

/// Issue counts grouped by status. Statuses with no issues are absent.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn status_counts(conn: &Connection) -> Result<HashMap<Status, i64>> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM issues GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        let raw: String = row.get(0)?;
        Ok((super::status_from_column(0, &raw)?, row.get::<_, i64>(1)?))
    })?;
    let mut counts = HashMap::new();
    for row in rows {
        let (status, count) = row?;
        counts.insert(status, count);
    }
    Ok(counts)
}

/// Labels attached to one issue, sorted by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_labels_for_issue(conn: &Connection, issue_id: i64) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT l.label_id, l.name FROM labels l
         JOIN issue_labels il ON il.label_id = l.label_id
         WHERE il.issue_id = ?1
         ORDER BY l.name",
    )?;
    let rows = stmt.query_map([issue_id], row_to_label)?;
    let mut labels = Vec::new();
    for row in rows {
        labels.push(row?);
    }
    Ok(labels)
}

/// A label with how many issues currently carry it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LabelCount {
    pub name: String,
    pub issues: i64,
}

/// Every label in the store with its attachment count, sorted by name.
/// Labels are never deleted, so detached ones show up with zero.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_labels(conn: &Connection) -> Result<Vec<LabelCount>> {
    let mut stmt = conn.prepare(
        "SELECT l.name, COUNT(il.issue_id) FROM labels l
         LEFT JOIN issue_labels il ON il.label_id = l.label_id
         GROUP BY l.label_id, l.name
         ORDER BY l.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(LabelCount {
            name: row.get(0)?,
            issues: row.get(1)?,
        })
    })?;
    let mut labels = Vec::new();
    for row in rows {
        labels.push(row?);
    }
    Ok(labels)
}

/// Comments on an issue, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_comments(
    conn: &Connection,
    issue_id: i64,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT comment_id, issue_id, author_id, body, created_at_us FROM comments
         WHERE issue_id = ?1
         ORDER BY created_at_us ASC, comment_id ASC{}",
        limit_clause(limit, offset)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([issue_id], row_to_comment)?;
    let mut comments = Vec::new();
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    match conn.query_row(
        "SELECT user_id, name, email FROM users WHERE user_id = ?1",
        [user_id],
        row_to_user,
    ) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn user_exists(conn: &Connection, user_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// All users, by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT user_id, name, email FROM users ORDER BY user_id")?;
    let rows = stmt.query_map([], row_to_user)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Open an existing store read-write, upgrading its schema if needed.
///
/// A missing file, an unreadable file, and a store without its meta row all
/// come back as `Ok(None)` so callers can point the user at `mw init`; the
/// details go to the log.
///
/// # Errors
///
/// Returns an error only for unexpected I/O failures (not missing/corrupt
/// stores).
pub fn try_open_store(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store exists but cannot be opened");
            return Ok(None);
        }
    };
    if let Err(e) = super::configure_connection(&conn) {
        tracing::warn!(path = %path.display(), error = %e, "store connection could not be configured");
        return Ok(None);
    }
    if let Err(e) = super::migrations::migrate(&mut conn) {
        tracing::warn!(path = %path.display(), error = %e, "store schema could not be migrated");
        return Ok(None);
    }
    let meta: rusqlite::Result<i64> = conn.query_row(
        "SELECT schema_version FROM store_meta WHERE id = 1",
        [],
        |row| row.get(0),
    );
    match meta {
        Ok(_) => Ok(Some(conn)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store is missing its meta row");
            Ok(None)
        }
    }
}
