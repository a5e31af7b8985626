//! `mw list` — list issues with filtering.

use crate::cmd::open_project;
use crate::output::{OutputMode, pretty_rule, render_error, render_mode};
use crate::validate;
use chrono::{DateTime, Local, Utc};
use clap::Args;
use marrow_core::config;
use marrow_core::db::query::{self, IssueFilter, SortOrder};
use marrow_core::model::Issue;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status: open, in-progress, closed.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Filter by assignee user id.
    #[arg(short, long)]
    pub assignee: Option<i64>,

    /// Filter by exact label name.
    #[arg(short, long)]
    pub label: Option<String>,

    /// Maximum issues to show (defaults to the configured limit).
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Number of issues to skip.
    #[arg(long)]
    pub offset: Option<u32>,

    /// Sort order: updated-desc, updated-asc, created-desc, created-asc.
    #[arg(long)]
    pub sort: Option<String>,
}

fn micros_to_local_datetime(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us)
        .map(|ts| {
            ts.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| us.to_string())
}

/// Sort order configured in `config.toml`, falling back to the default
/// when the value does not parse.
fn configured_sort(marrow_dir: &Path) -> SortOrder {
    let cfg = match config::load_project_config(marrow_dir) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable project config; using defaults");
            return SortOrder::default();
        }
    };
    cfg.list.default_sort.parse().unwrap_or_else(|e| {
        tracing::warn!(
            value = %cfg.list.default_sort,
            error = %e,
            "invalid default_sort in config; using updated-desc"
        );
        SortOrder::default()
    })
}

fn configured_limit(marrow_dir: &Path) -> u32 {
    config::load_project_config(marrow_dir)
        .map(|cfg| cfg.list.default_limit)
        .unwrap_or_else(|_| config::ListConfig::default().default_limit)
}

/// Execute `mw list`.
///
/// # Errors
///
/// Returns an error if a filter value does not parse or a query fails.
pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let status = match args.status.as_deref().map(validate::validate_status) {
        Some(Ok(status)) => Some(status),
        Some(Err(e)) => {
            render_error(output, &e.to_cli_error())?;
            anyhow::bail!("{}", e.reason);
        }
        None => None,
    };
    let sort_flag = match args.sort.as_deref().map(validate::validate_sort) {
        Some(Ok(sort)) => Some(sort),
        Some(Err(e)) => {
            render_error(output, &e.to_cli_error())?;
            anyhow::bail!("{}", e.reason);
        }
        None => None,
    };

    let (marrow_dir, conn) = open_project(output, project_root)?;

    let filter = IssueFilter {
        status,
        assignee_id: args.assignee,
        label: args.label.clone(),
        limit: Some(args.limit.unwrap_or_else(|| configured_limit(&marrow_dir))),
        offset: args.offset,
        sort: sort_flag.unwrap_or_else(|| configured_sort(&marrow_dir)),
    };

    let issues = query::list_issues(&conn, &filter)?;

    render_mode(
        output,
        &issues,
        |issues, w| render_list_text(issues, w),
        |issues, w| render_list_pretty(issues, w),
    )
}

fn render_list_pretty(issues: &[Issue], w: &mut dyn Write) -> std::io::Result<()> {
    if issues.is_empty() {
        writeln!(w, "No issues found.")?;
        return Ok(());
    }
    writeln!(
        w,
        "{:>6}  {:<12} {:>4}  {:<19}  TITLE",
        "ID", "STATUS", "VER", "UPDATED"
    )?;
    pretty_rule(w)?;
    for issue in issues {
        // Status's Display ignores padding, so align via a String.
        let status = issue.status.to_string();
        writeln!(
            w,
            "{:>6}  {status:<12} {:>4}  {:<19}  {}",
            issue.id,
            issue.version,
            micros_to_local_datetime(issue.updated_at_us),
            issue.title
        )?;
    }
    writeln!(w)?;
    writeln!(w, "{} issue(s)", issues.len())
}

fn render_list_text(issues: &[Issue], w: &mut dyn Write) -> std::io::Result<()> {
    for issue in issues {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            issue.id, issue.status, issue.version, issue.title
        )?;
    }
    Ok(())
}
