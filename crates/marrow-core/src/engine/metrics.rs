//! Read-side aggregates over resolution stamps.

use rusqlite::Connection;

use crate::error::EngineResult;

/// Mean `(resolved_at_us - created_at_us)` in fractional seconds across
/// every issue that has ever been resolved, or `None` when none has.
///
/// Reopened issues keep their stamp, so they stay in the average. The
/// whole computation is one SQL aggregate; no snapshot or lock is taken.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn average_resolution_latency(conn: &Connection) -> EngineResult<Option<f64>> {
    let avg_us: Option<f64> = conn.query_row(
        "SELECT AVG(CAST(resolved_at_us - created_at_us AS REAL)) FROM issues
         WHERE resolved_at_us IS NOT NULL",
        [],
        |row| row.get(0),
    )?;
    Ok(avg_us.map(|us| us / 1_000_000.0))
}

/// How many issues carry a resolution stamp.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn resolved_issue_count(conn: &Connection) -> EngineResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM issues WHERE resolved_at_us IS NOT NULL",
        [],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_connection, migrations};
    use rusqlite::params;

    fn test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();
        migrations::migrate(&mut conn).unwrap();
        conn
    }

    fn insert_issue(conn: &Connection, created_us: i64, resolved_us: Option<i64>) {
        conn.execute(
            "INSERT INTO issues (title, status, created_at_us, updated_at_us, resolved_at_us)
             VALUES ('x', ?1, ?2, ?2, ?3)",
            params![
                if resolved_us.is_some() { "CLOSED" } else { "OPEN" },
                created_us,
                resolved_us,
            ],
        )
        .unwrap();
    }

    #[test]
    fn no_resolved_issues_means_none() {
        let conn = test_db();
        insert_issue(&conn, 1000, None);
        assert_eq!(average_resolution_latency(&conn).unwrap(), None);
        assert_eq!(resolved_issue_count(&conn).unwrap(), 0);
    }

    #[test]
    fn one_hour_resolution_is_exactly_3600_seconds() {
        let conn = test_db();
        let hour_us = 3_600_000_000;
        insert_issue(&conn, 1_000_000, Some(1_000_000 + hour_us));

        let avg = average_resolution_latency(&conn).unwrap().unwrap();
        assert!((avg - 3600.0).abs() < f64::EPSILON);
        assert_eq!(resolved_issue_count(&conn).unwrap(), 1);
    }

    #[test]
    fn average_spans_all_resolved_issues() {
        let conn = test_db();
        insert_issue(&conn, 0, Some(2_000_000));
        insert_issue(&conn, 0, Some(4_000_000));
        insert_issue(&conn, 0, None);

        let avg = average_resolution_latency(&conn).unwrap().unwrap();
        assert!((avg - 3.0).abs() < f64::EPSILON);
        assert_eq!(resolved_issue_count(&conn).unwrap(), 2);
    }

    #[test]
    fn reopened_issues_keep_contributing() {
        let conn = test_db();
        // Reopened: status OPEN but the stamp survives.
        conn.execute(
            "INSERT INTO issues (title, status, created_at_us, updated_at_us, resolved_at_us)
             VALUES ('x', 'OPEN', 0, 0, 5000000)",
            [],
        )
        .unwrap();

        let avg = average_resolution_latency(&conn).unwrap().unwrap();
        assert!((avg - 5.0).abs() < f64::EPSILON);
        assert_eq!(resolved_issue_count(&conn).unwrap(), 1);
    }
}
