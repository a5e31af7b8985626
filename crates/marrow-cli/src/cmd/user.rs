//! `mw user` — manage the people issues get assigned to.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error, render_mode};
use crate::validate;
use clap::{Args, Subcommand};
use marrow_core::db::query;
use marrow_core::engine::create;
use marrow_core::model::User;
use std::io::Write;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user. Emails must be unique.
    Add(AddArgs),

    /// List registered users.
    Ls(LsArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Display name.
    #[arg(short, long)]
    pub name: String,

    /// Email address, unique across the store.
    #[arg(short, long)]
    pub email: String,
}

#[derive(Args, Debug, Default)]
pub struct LsArgs {}

/// Execute `mw user add`.
///
/// # Errors
///
/// Returns an error for an invalid name/email or a duplicate email.
pub fn run_user_add(
    args: &AddArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    if let Err(e) = validate::validate_email(&args.email) {
        render_error(output, &e.to_cli_error())?;
        anyhow::bail!("{}", e.reason);
    }

    let (_marrow_dir, mut conn) = open_project(output, project_root)?;

    let user = match create::create_user(&mut conn, &args.name, &args.email) {
        Ok(user) => user,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    if output.is_json() || !quiet {
        render(output, &user, |user, w| {
            writeln!(w, "✓ Added user #{} ({} <{}>)", user.id, user.name, user.email)
        })?;
    }
    Ok(())
}

/// Execute `mw user ls`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn run_user_ls(_args: &LsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let (_marrow_dir, conn) = open_project(output, project_root)?;
    let users = query::list_users(&conn)?;

    render_mode(
        output,
        &users,
        |users, w| render_users_text(users, w),
        |users, w| render_users_pretty(users, w),
    )
}

fn render_users_pretty(users: &[User], w: &mut dyn Write) -> std::io::Result<()> {
    if users.is_empty() {
        writeln!(w, "No users yet.")?;
        return Ok(());
    }
    writeln!(w, "{:>6}  {:<20} EMAIL", "ID", "NAME")?;
    for user in users {
        writeln!(w, "{:>6}  {:<20} {}", user.id, user.name, user.email)?;
    }
    Ok(())
}

fn render_users_text(users: &[User], w: &mut dyn Write) -> std::io::Result<()> {
    for user in users {
        writeln!(w, "{}\t{}\t{}", user.id, user.name, user.email)?;
    }
    Ok(())
}
