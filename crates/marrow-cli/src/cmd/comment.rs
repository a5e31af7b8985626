//! `mw comment` — append-only discussion on an issue.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error, render_mode};
use crate::validate;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use marrow_core::db::query;
use marrow_core::engine::create;
use marrow_core::error::EngineError;
use marrow_core::model::Comment;
use std::io::Write;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    /// Add a comment to an issue. Comments are immutable once written.
    Add(AddArgs),

    /// List an issue's comments, oldest first.
    Ls(LsArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Issue id to comment on.
    pub id: i64,

    /// Comment text.
    #[arg(short, long)]
    pub body: String,

    /// Author user id.
    #[arg(short, long)]
    pub author: i64,
}

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Issue id whose comments to list.
    pub id: i64,

    /// Maximum comments to show.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Number of comments to skip.
    #[arg(long)]
    pub offset: Option<u32>,
}

fn micros_to_rfc3339(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| us.to_string())
}

/// Execute `mw comment add`.
///
/// # Errors
///
/// Returns an error for a blank body or a dangling issue/author reference.
pub fn run_comment_add(
    args: &AddArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    if let Err(e) = validate::validate_body(&args.body) {
        render_error(output, &e.to_cli_error())?;
        anyhow::bail!("{}", e.reason);
    }

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let comment = match create::add_comment(&mut conn, args.id, args.author, &args.body) {
        Ok(comment) => comment,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    if output.is_json() || !quiet {
        render(output, &comment, |comment, w| {
            writeln!(w, "✓ Added comment #{} to issue #{}", comment.id, comment.issue_id)
        })?;
    }
    Ok(())
}

/// Execute `mw comment ls`.
///
/// # Errors
///
/// Returns an error if the issue does not exist or the query fails.
pub fn run_comment_ls(args: &LsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let (_marrow_dir, conn) = open_project(output, project_root)?;

    if !query::issue_exists(&conn, args.id)? {
        let e = EngineError::IssueNotFound(args.id);
        render_error(output, &CliError::from(&e))?;
        anyhow::bail!("{e}");
    }

    let comments = query::get_comments(&conn, args.id, args.limit, args.offset)?;

    render_mode(
        output,
        &comments,
        |comments, w| render_comments_text(comments, w),
        |comments, w| render_comments_pretty(comments, w),
    )
}

fn render_comments_pretty(comments: &[Comment], w: &mut dyn Write) -> std::io::Result<()> {
    if comments.is_empty() {
        writeln!(w, "No comments yet.")?;
        return Ok(());
    }
    for (i, comment) in comments.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        writeln!(
            w,
            "[{}] user {}: {}",
            micros_to_rfc3339(comment.created_at_us),
            comment.author_id,
            comment.body
        )?;
    }
    Ok(())
}

fn render_comments_text(comments: &[Comment], w: &mut dyn Write) -> std::io::Result<()> {
    for comment in comments {
        writeln!(
            w,
            "{}\t{}\t{}",
            micros_to_rfc3339(comment.created_at_us),
            comment.author_id,
            comment.body
        )?;
    }
    Ok(())
}
