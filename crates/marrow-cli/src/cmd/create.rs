//! `mw create` — create a new issue.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error};
use crate::validate;
use clap::Args;
use marrow_core::engine::create;
use marrow_core::model::NewIssue;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new issue.
    #[arg(short, long)]
    pub title: String,

    /// Description text.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Assignee user id.
    #[arg(short, long)]
    pub assignee: Option<i64>,

    /// Initial status: open, in-progress, closed.
    #[arg(short, long, default_value = "open")]
    pub status: String,
}

/// Execute `mw create`.
///
/// # Errors
///
/// Returns an error if validation fails, the assignee does not exist, or
/// the store cannot be opened.
pub fn run_create(
    args: &CreateArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    if let Err(e) = validate::validate_title(&args.title) {
        render_error(output, &e.to_cli_error())?;
        anyhow::bail!("{}", e.reason);
    }
    let status = match validate::validate_status(&args.status) {
        Ok(status) => status,
        Err(e) => {
            render_error(output, &e.to_cli_error())?;
            anyhow::bail!("{}", e.reason);
        }
    };

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let new = NewIssue {
        title: args.title.clone(),
        description: args.description.clone(),
        assignee_id: args.assignee,
        status,
    };
    let issue = match create::create_issue(&mut conn, &new) {
        Ok(issue) => issue,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    if output.is_json() || !quiet {
        render(output, &issue, |issue, w| {
            writeln!(w, "✓ Created issue #{} (version {})", issue.id, issue.version)?;
            writeln!(w, "  {}", issue.title)
        })?;
    }
    Ok(())
}
