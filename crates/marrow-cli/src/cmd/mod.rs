//! Command implementations for the `mw` binary.

pub mod comment;
pub mod create;
pub mod import;
pub mod init;
pub mod label;
pub mod list;
pub mod show;
pub mod stats;
pub mod status;
pub mod update;
pub mod user;

use crate::output::{CliError, OutputMode, render_error};
use anyhow::Result;
use marrow_core::db::query;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const MARROW_DIR: &str = ".marrow";
pub const DB_FILE: &str = "marrow.db";

/// Walk up from `start` looking for a `.marrow/` directory.
pub fn find_marrow_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(MARROW_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Locate the enclosing project and open its store.
///
/// Renders a structured error and bails when no project or store is
/// found, so command handlers can simply `?` this.
///
/// # Errors
///
/// Returns an error if no project encloses `start`, the store is missing
/// or unreadable, or rendering fails.
pub fn open_project(output: OutputMode, start: &Path) -> Result<(PathBuf, Connection)> {
    let Some(marrow_dir) = find_marrow_dir(start) else {
        render_error(
            output,
            &CliError::with_details(
                "not inside a marrow project",
                "run `mw init` in the project root first",
                "E0100",
            ),
        )?;
        anyhow::bail!("no .marrow directory found");
    };

    let db_path = marrow_dir.join(DB_FILE);
    let Some(conn) = query::try_open_store(&db_path)? else {
        render_error(
            output,
            &CliError::with_details(
                format!("store not found at {}", db_path.display()),
                "run `mw init` to create it",
                "E0101",
            ),
        )?;
        anyhow::bail!("store not found");
    };

    Ok((marrow_dir, conn))
}
