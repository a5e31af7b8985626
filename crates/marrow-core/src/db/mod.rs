//! SQLite store: open, configure, migrate.

pub mod migrations;
pub mod query;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::model::Status;

/// How long a connection waits on a locked store before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store at `path`, configure the connection, and
/// migrate it to the latest schema version.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the file
/// cannot be opened, or a migration fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store directory {}", parent.display()))?;
    }
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;
    configure_connection(&conn)
        .with_context(|| format!("failed to configure store at {}", path.display()))?;
    migrations::migrate(&mut conn)
        .with_context(|| format!("failed to migrate store at {}", path.display()))?;
    Ok(conn)
}

/// Per-connection pragmas. Foreign keys are off by default in SQLite and
/// the weak/strong reference rules depend on them.
pub(crate) fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // journal_mode returns the resulting mode as a row.
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Map a status column's text to [`Status`], reporting the column index on
/// failure like any other column conversion.
pub(crate) fn status_from_column(idx: usize, raw: &str) -> rusqlite::Result<Status> {
    raw.parse::<Status>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
