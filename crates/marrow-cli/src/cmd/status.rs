//! `mw status` — set one status across many issues atomically.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error};
use crate::validate;
use clap::Args;
use marrow_core::engine::batch;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Target status: open, in-progress, closed.
    pub status: String,

    /// Issue ids to update. One missing id aborts the whole batch.
    #[arg(value_name = "IDS", required = true)]
    pub ids: Vec<i64>,
}

/// Execute `mw status <STATUS> <IDS…>`.
///
/// Every listed issue gets the status, a version bump, and a fresh
/// `updated_at`; closing also stamps `resolved_at`. The batch is
/// all-or-nothing.
///
/// # Errors
///
/// Returns an error naming the first missing id, leaving every issue
/// untouched.
pub fn run_status(
    args: &StatusArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    let status = match validate::validate_status(&args.status) {
        Ok(status) => status,
        Err(e) => {
            render_error(output, &e.to_cli_error())?;
            anyhow::bail!("{}", e.reason);
        }
    };

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let report = match batch::bulk_set_status(&mut conn, &args.ids, status) {
        Ok(report) => report,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    if output.is_json() || !quiet {
        render(output, &report, |report, w| {
            writeln!(w, "✓ Set status {status} on {} issue(s)", report.updated)
        })?;
    }
    Ok(())
}
