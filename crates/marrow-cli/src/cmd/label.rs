//! `mw label` — whole-set label reconciliation and the label inventory.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error, render_mode};
use crate::validate;
use clap::{Args, Subcommand};
use marrow_core::db::query::{self, LabelCount};
use marrow_core::engine::labels;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Replace an issue's labels with exactly this set.
    #[command(
        after_help = "EXAMPLES:\n    # Attach two labels, detaching everything else\n    mw label set 7 bug urgent\n\n    # Clear all labels\n    mw label set 7"
    )]
    Set(SetArgs),

    /// List every label with the number of issues carrying it.
    Ls(LsArgs),
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Issue id whose labels are replaced.
    pub id: i64,

    /// Label names. Duplicates collapse; passing none clears the set.
    #[arg(value_name = "NAMES")]
    pub names: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct LsArgs {}

/// Result of `mw label set` as emitted in JSON output.
#[derive(Debug, Serialize)]
pub struct LabelSetReport {
    pub issue_id: i64,
    pub labels: Vec<String>,
}

/// Execute `mw label set <ID> [NAMES…]`.
///
/// # Errors
///
/// Returns an error if a name fails validation or the issue is missing.
pub fn run_label_set(
    args: &SetArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    for name in &args.names {
        if let Err(e) = validate::validate_label(name) {
            render_error(output, &e.to_cli_error())?;
            anyhow::bail!("{}", e.reason);
        }
    }

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let applied = match labels::set_issue_labels(&mut conn, args.id, &args.names) {
        Ok(applied) => applied,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    let report = LabelSetReport {
        issue_id: args.id,
        labels: applied.into_iter().map(|l| l.name).collect(),
    };

    if output.is_json() || !quiet {
        render(output, &report, |report, w| {
            if report.labels.is_empty() {
                writeln!(w, "✓ Cleared labels on issue #{}", report.issue_id)
            } else {
                writeln!(
                    w,
                    "✓ Set {} label(s) on issue #{}: {}",
                    report.labels.len(),
                    report.issue_id,
                    report.labels.join(", ")
                )
            }
        })?;
    }
    Ok(())
}

/// Execute `mw label ls`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn run_label_ls(
    _args: &LsArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let (_marrow_dir, conn) = open_project(output, project_root)?;
    let counts = query::list_labels(&conn)?;

    render_mode(
        output,
        &counts,
        |counts, w| render_labels_text(counts, w),
        |counts, w| render_labels_pretty(counts, w),
    )
}

fn render_labels_pretty(counts: &[LabelCount], w: &mut dyn Write) -> std::io::Result<()> {
    if counts.is_empty() {
        writeln!(w, "No labels yet.")?;
        return Ok(());
    }
    writeln!(w, "{:<30} ISSUES", "LABEL")?;
    for count in counts {
        writeln!(w, "{:<30} {}", count.name, count.issues)?;
    }
    Ok(())
}

fn render_labels_text(counts: &[LabelCount], w: &mut dyn Write) -> std::io::Result<()> {
    for count in counts {
        writeln!(w, "{}\t{}", count.name, count.issues)?;
    }
    Ok(())
}
