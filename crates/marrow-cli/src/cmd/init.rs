//! `mw init` — scaffold a marrow project in the current directory.

use crate::cmd::{DB_FILE, MARROW_DIR};
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use marrow_core::config::CONFIG_FILE;
use marrow_core::db;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite config.toml with defaults even if it already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[list]\n\
    default_limit = 50\n\
    default_sort = \"updated-desc\"\n";

const GITIGNORE: &str = "marrow.db\nmarrow.db-wal\nmarrow.db-shm\n";

#[derive(Debug, Serialize)]
pub struct InitReport {
    /// False when `.marrow/` already existed.
    pub created: bool,
    pub marrow_dir: String,
    pub db_path: String,
}

/// Execute `mw init`. Creates the project skeleton:
///
/// ```text
/// .marrow/
///   marrow.db     (SQLite store, migrated to the latest schema)
///   config.toml   (default project config)
///   .gitignore    (store + WAL sidecar files)
/// ```
///
/// Re-running against an existing project is safe: pending migrations are
/// applied and an existing config is left alone unless `--force`.
///
/// # Errors
///
/// Returns an error if a filesystem operation or a migration fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let marrow_dir = project_root.join(MARROW_DIR);
    let created = !marrow_dir.is_dir();

    std::fs::create_dir_all(&marrow_dir)
        .with_context(|| format!("failed to create {}", marrow_dir.display()))?;

    // Opening the store applies any pending migrations.
    let db_path = marrow_dir.join(DB_FILE);
    let _conn = db::open_store(&db_path)?;

    let config_path = marrow_dir.join(CONFIG_FILE);
    if args.force || !config_path.is_file() {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }

    let gitignore_path = marrow_dir.join(".gitignore");
    if !gitignore_path.is_file() {
        std::fs::write(&gitignore_path, GITIGNORE)
            .with_context(|| format!("failed to write {}", gitignore_path.display()))?;
    }

    let report = InitReport {
        created,
        marrow_dir: marrow_dir.display().to_string(),
        db_path: db_path.display().to_string(),
    };

    render(output, &report, |report, w| render_init_human(report, w))
}

fn render_init_human(report: &InitReport, w: &mut dyn Write) -> std::io::Result<()> {
    if report.created {
        writeln!(w, "✓ Initialized marrow project.")?;
    } else {
        writeln!(w, "✓ Project already initialized; store migrated.")?;
    }
    writeln!(w)?;
    writeln!(w, "  Store:  {}", report.db_path)?;
    writeln!(w, "  Config: {}/{CONFIG_FILE}", report.marrow_dir)?;
    writeln!(w)?;
    writeln!(w, "Next steps:")?;
    writeln!(w, "  mw user add --name alice --email alice@example.com")?;
    writeln!(w, "  mw create --title \"My first issue\"")?;
    Ok(())
}
