//! `mw update` — apply a partial edit to an issue under optimistic locking.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error};
use crate::validate;
use clap::Args;
use marrow_core::engine::update;
use marrow_core::model::IssuePatch;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue id to update.
    pub id: i64,

    /// Version the caller last read. The update is refused if the stored
    /// version differs.
    #[arg(long, value_name = "N")]
    pub expect_version: i64,

    /// New title.
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description text.
    #[arg(short, long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Clear the description entirely.
    #[arg(long)]
    pub clear_description: bool,

    /// New status: open, in-progress, closed.
    #[arg(short, long)]
    pub status: Option<String>,
}

impl UpdateArgs {
    /// Translate flags into the engine's exclude-unset patch. An omitted
    /// flag leaves the field alone; `--clear-description` maps to an
    /// explicit clear.
    fn to_patch(&self) -> Result<IssuePatch, validate::ValidationError> {
        if let Some(ref title) = self.title {
            validate::validate_title(title)?;
        }
        let status = self
            .status
            .as_deref()
            .map(validate::validate_status)
            .transpose()?;
        let description = if self.clear_description {
            Some(None)
        } else {
            self.description.clone().map(Some)
        };
        Ok(IssuePatch {
            title: self.title.clone(),
            description,
            status,
        })
    }
}

/// Execute `mw update`.
///
/// An empty patch is accepted: the issue's version still advances, which
/// callers use as a cheap touch.
///
/// # Errors
///
/// Returns an error on validation failure, a missing issue, or a version
/// conflict.
pub fn run_update(
    args: &UpdateArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    let patch = match args.to_patch() {
        Ok(patch) => patch,
        Err(e) => {
            render_error(output, &e.to_cli_error())?;
            anyhow::bail!("{}", e.reason);
        }
    };

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let issue = match update::update_issue(&mut conn, args.id, &patch, args.expect_version) {
        Ok(issue) => issue,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    if output.is_json() || !quiet {
        render(output, &issue, |issue, w| {
            writeln!(
                w,
                "✓ Updated issue #{} (now version {}, status {})",
                issue.id, issue.version, issue.status
            )
        })?;
    }
    Ok(())
}
