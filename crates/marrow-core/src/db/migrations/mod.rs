//! Versioned schema migrations driven by `PRAGMA user_version`.

use rusqlite::Connection;

use super::schema;

/// Schema version this binary writes.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Ordered migration steps: (target version, SQL that gets there).
const MIGRATIONS: &[(u32, &str)] = &[
    (1, schema::MIGRATION_V1_SQL),
    (2, schema::MIGRATION_V2_SQL),
];

/// Read the store's current schema version.
///
/// # Errors
///
/// Returns an error if the pragma read fails or the stored value does not
/// fit a `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    u32::try_from(version).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(e))
    })
}

/// Apply all pending migrations, returning the final schema version.
///
/// Each step runs in its own transaction; a failing step rolls back and
/// leaves the store at the version it had before that step.
///
/// # Errors
///
/// Returns an error if a migration statement or commit fails.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let mut version = current_schema_version(conn)?;
    for (target, sql) in MIGRATIONS {
        if *target > version {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.pragma_update(None, "user_version", *target)?;
            tx.execute(
                "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
                [*target],
            )?;
            tx.commit()?;
            version = *target;
        }
    }
    Ok(version)
}
