//! `mw import` — bulk-load issues from a JSON Lines file.
//!
//! Each line is one object with `title` and `assignee_id` string fields
//! plus an optional `description`. Lines that are not valid JSON are
//! skipped with a warning; everything parseable goes to the engine in one
//! batch, which validates the rows individually.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error};
use anyhow::Context as _;
use clap::Args;
use marrow_core::engine::batch::{self, ImportReport, RawIssueRow};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON Lines file to import.
    pub file: PathBuf,
}

/// Combined outcome: the engine's per-row report plus lines the CLI could
/// not parse at all.
#[derive(Debug, Serialize)]
pub struct ImportCliReport {
    #[serde(flatten)]
    pub report: ImportReport,
    pub skipped_invalid: usize,
}

fn parse_jsonl(content: &str) -> (Vec<RawIssueRow>, usize) {
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawIssueRow>(line) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipping unparseable import line");
                skipped += 1;
            }
        }
    }
    (rows, skipped)
}

/// Execute `mw import <FILE>`.
///
/// Invalid rows are reported and skipped; valid rows are inserted in one
/// transaction. A bad assignee reference rolls back the entire batch.
///
/// # Errors
///
/// Returns an error if the file is unreadable or the batch insert fails.
pub fn run_import(
    args: &ImportArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let (rows, skipped_invalid) = parse_jsonl(&content);

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let report = match batch::import_issues(&mut conn, &rows) {
        Ok(report) => report,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    let payload = ImportCliReport {
        report,
        skipped_invalid,
    };

    render(output, &payload, |payload, w| render_import_human(payload, w))
}

fn render_import_human(payload: &ImportCliReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "✓ Imported {} issue(s), {} row(s) failed validation",
        payload.report.created, payload.report.failed
    )?;
    if payload.skipped_invalid > 0 {
        writeln!(w, "  {} unparseable line(s) skipped", payload.skipped_invalid)?;
    }
    for error in &payload.report.errors {
        writeln!(w, "  {error}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::init;

    #[test]
    fn parse_jsonl_splits_rows_and_skips_garbage() {
        let content = "\
            {\"title\": \"one\"}\n\
            \n\
            not json at all\n\
            {\"title\": \"two\", \"assignee_id\": \"3\"}\n";
        let (rows, skipped) = parse_jsonl(content);
        assert_eq!(rows.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(rows[0].title.as_deref(), Some("one"));
        assert_eq!(rows[1].assignee_id.as_deref(), Some("3"));
    }

    #[test]
    fn parse_jsonl_tolerates_unknown_fields() {
        let (rows, skipped) = parse_jsonl("{\"title\": \"x\", \"priority\": \"high\"}\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 0);
    }

    fn init_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        init::run_init(&init::InitArgs { force: false }, OutputMode::Text, dir.path())
            .expect("init");
        dir
    }

    fn seed_user(dir: &std::path::Path) -> i64 {
        let mut conn = marrow_core::db::open_store(&dir.join(".marrow/marrow.db")).expect("open");
        marrow_core::engine::create::create_user(&mut conn, "ada", "ada@example.com")
            .expect("user")
            .id
    }

    #[test]
    fn run_import_mixed_rows() {
        let dir = init_project();
        let uid = seed_user(dir.path());
        let file = dir.path().join("issues.jsonl");
        std::fs::write(
            &file,
            format!(
                "{{\"title\": \"first\", \"assignee_id\": \"{uid}\"}}\n\
                 {{\"description\": \"no title\", \"assignee_id\": \"{uid}\"}}\n\
                 {{\"title\": \"third\", \"assignee_id\": \"{uid}\"}}\n"
            ),
        )
        .unwrap();

        let args = ImportArgs { file };
        run_import(&args, OutputMode::Text, dir.path()).expect("import");

        let conn =
            marrow_core::db::open_store(&dir.path().join(".marrow/marrow.db")).expect("open");
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 2, "only rows with a title land");
    }

    #[test]
    fn run_import_unknown_assignee_rolls_back() {
        let dir = init_project();
        let uid = seed_user(dir.path());
        let file = dir.path().join("issues.jsonl");
        std::fs::write(
            &file,
            format!(
                "{{\"title\": \"ok\", \"assignee_id\": \"{uid}\"}}\n\
                 {{\"title\": \"dangling\", \"assignee_id\": \"999\"}}\n"
            ),
        )
        .unwrap();

        let args = ImportArgs { file };
        assert!(run_import(&args, OutputMode::Text, dir.path()).is_err());

        let conn =
            marrow_core::db::open_store(&dir.path().join(".marrow/marrow.db")).expect("open");
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0, "batch must roll back entirely");
    }

    #[test]
    fn run_import_missing_file_fails() {
        let dir = init_project();
        let args = ImportArgs {
            file: dir.path().join("nope.jsonl"),
        };
        assert!(run_import(&args, OutputMode::Text, dir.path()).is_err());
    }

    #[test]
    fn import_cli_report_flattens_engine_fields() {
        let payload = ImportCliReport {
            report: ImportReport {
                created: 2,
                failed: 1,
                errors: vec!["row 2: missing title".into()],
            },
            skipped_invalid: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["created"], 2);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["skipped_invalid"], 1);
    }
}
