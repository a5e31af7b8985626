//! `mw stats` — project reporting: status counts and resolution latency.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error};
use clap::Args;
use marrow_core::db::query;
use marrow_core::engine::metrics;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Arguments for `mw stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

/// Report payload for `mw stats`.
#[derive(Debug, Serialize)]
pub struct ProjectStats {
    pub by_status: BTreeMap<String, i64>,
    pub total: i64,
    pub resolved: u64,
    /// Mean wall-clock seconds from creation to first close. Absent until
    /// at least one issue has been resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_resolution_seconds: Option<f64>,
}

/// Execute `mw stats`.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn run_stats(_args: &StatsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let (_marrow_dir, conn) = open_project(output, project_root)?;

    let by_status: BTreeMap<String, i64> = query::status_counts(&conn)?
        .into_iter()
        .map(|(status, count)| (status.to_string(), count))
        .collect();
    let total = query::count_issues(&conn)?;

    let resolved = match metrics::resolved_issue_count(&conn) {
        Ok(resolved) => resolved,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };
    let avg_resolution_seconds = match metrics::average_resolution_latency(&conn) {
        Ok(avg) => avg,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    let payload = ProjectStats {
        by_status,
        total,
        resolved,
        avg_resolution_seconds,
    };

    render(output, &payload, |payload, w| render_stats_human(payload, w))
}

fn render_stats_human(stats: &ProjectStats, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Project stats")?;

    writeln!(w, "\nIssues by status:")?;
    if stats.by_status.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for (status, count) in &stats.by_status {
        writeln!(w, "  {status}: {count}")?;
    }
    writeln!(w, "  total: {}", stats.total)?;

    writeln!(w, "\nResolution:")?;
    writeln!(w, "  resolved issues: {}", stats.resolved)?;
    match stats.avg_resolution_seconds {
        Some(avg) => writeln!(w, "  avg latency:     {avg:.1}s")?,
        None => writeln!(w, "  avg latency:     n/a")?,
    }

    Ok(())
}
