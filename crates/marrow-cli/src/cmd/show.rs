//! `mw show` — display full details of a single issue.

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use marrow_core::db::query;
use marrow_core::error::EngineError;
use marrow_core::model::Status;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue id to display.
    pub id: i64,
}

/// Full issue detail as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct ShowIssue {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    pub version: i64,
    pub created_at_us: i64,
    pub updated_at_us: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at_us: Option<i64>,
    pub labels: Vec<String>,
    pub comments: Vec<ShowComment>,
}

/// A single comment in the `show` output.
#[derive(Debug, Serialize)]
pub struct ShowComment {
    pub author_id: i64,
    pub body: String,
    pub created_at_us: i64,
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

/// Execute `mw show <ID>`.
///
/// # Errors
///
/// Returns an error if the issue does not exist or a query fails.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let (_marrow_dir, conn) = open_project(output, project_root)?;

    let Some(issue) = query::get_issue(&conn, args.id)? else {
        let e = EngineError::IssueNotFound(args.id);
        render_error(output, &CliError::from(&e))?;
        anyhow::bail!("{e}");
    };

    let labels: Vec<String> = query::get_labels_for_issue(&conn, args.id)?
        .into_iter()
        .map(|l| l.name)
        .collect();

    let comments: Vec<ShowComment> = query::get_comments(&conn, args.id, None, None)?
        .into_iter()
        .map(|c| ShowComment {
            author_id: c.author_id,
            body: c.body,
            created_at_us: c.created_at_us,
        })
        .collect();

    let show = ShowIssue {
        id: issue.id,
        title: issue.title,
        description: issue.description,
        status: issue.status,
        assignee_id: issue.assignee_id,
        version: issue.version,
        created_at_us: issue.created_at_us,
        updated_at_us: issue.updated_at_us,
        resolved_at_us: issue.resolved_at_us,
        labels,
        comments,
    };

    render_mode(
        output,
        &show,
        |show, w| render_show_text(show, w),
        |show, w| render_show_pretty(show, w),
    )
}

fn render_show_pretty(show: &ShowIssue, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Issue #{}", show.id))?;
    writeln!(w, "{}", show.title)?;
    writeln!(w)?;
    pretty_kv(w, "status", show.status.to_string())?;
    pretty_kv(w, "version", show.version.to_string())?;
    if let Some(assignee) = show.assignee_id {
        pretty_kv(w, "assignee", format!("user {assignee}"))?;
    }
    if !show.labels.is_empty() {
        pretty_kv(w, "labels", show.labels.join(", "))?;
    }
    pretty_kv(w, "created", micros_to_local_datetime(show.created_at_us))?;
    pretty_kv(w, "updated", micros_to_local_datetime(show.updated_at_us))?;
    if let Some(resolved) = show.resolved_at_us {
        pretty_kv(w, "resolved", micros_to_local_datetime(resolved))?;
    }

    if let Some(ref desc) = show.description {
        writeln!(w)?;
        pretty_section(w, "Description")?;
        for line in desc.lines() {
            writeln!(w, "{line}")?;
        }
    }

    if !show.comments.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Comments ({})", show.comments.len()))?;
        for (i, comment) in show.comments.iter().enumerate() {
            if i > 0 {
                writeln!(w)?;
            }
            writeln!(
                w,
                "[{}] user {}: {}",
                micros_to_local_datetime(comment.created_at_us),
                comment.author_id,
                comment.body
            )?;
        }
    }
    Ok(())
}

fn render_show_text(show: &ShowIssue, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Issue #{}", show.id)?;
    writeln!(w, "{}", show.title)?;
    writeln!(w, "status:    {}", show.status)?;
    writeln!(w, "version:   {}", show.version)?;
    if let Some(assignee) = show.assignee_id {
        writeln!(w, "assignee:  user {assignee}")?;
    }
    if !show.labels.is_empty() {
        writeln!(w, "labels:    {}", show.labels.join(", "))?;
    }
    writeln!(w, "created:   {}", micros_to_local_datetime(show.created_at_us))?;
    writeln!(w, "updated:   {}", micros_to_local_datetime(show.updated_at_us))?;
    if let Some(resolved) = show.resolved_at_us {
        writeln!(w, "resolved:  {}", micros_to_local_datetime(resolved))?;
    }
    if let Some(ref desc) = show.description {
        writeln!(w)?;
        for line in desc.lines() {
            writeln!(w, "{line}")?;
        }
    }
    for comment in &show.comments {
        writeln!(
            w,
            "[{}] user {}: {}",
            micros_to_local_datetime(comment.created_at_us),
            comment.author_id,
            comment.body
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::init;
    use marrow_core::engine::create;
    use marrow_core::model::NewIssue;

    #[test]
    fn show_args_parses_id() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ShowArgs,
        }
        let w = Wrapper::parse_from(["test", "42"]);
        assert_eq!(w.args.id, 42);
    }

    fn make_show_issue() -> ShowIssue {
        ShowIssue {
            id: 7,
            title: "Fix authentication timeout".into(),
            description: Some("The auth service times out after 30s.".into()),
            status: Status::InProgress,
            assignee_id: Some(3),
            version: 4,
            created_at_us: 500,
            updated_at_us: 2_000,
            resolved_at_us: None,
            labels: vec!["backend".into(), "auth".into()],
            comments: vec![ShowComment {
                author_id: 3,
                body: "Looking into it.".into(),
                created_at_us: 1_000,
            }],
        }
    }

    #[test]
    fn render_pretty_includes_all_fields() {
        let show = make_show_issue();
        let mut buf = Vec::new();
        render_show_pretty(&show, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.contains("Issue #7"));
        assert!(out.contains("Fix authentication timeout"));
        assert!(out.contains("IN_PROGRESS"));
        assert!(out.contains("user 3"));
        assert!(out.contains("backend, auth"));
        assert!(out.contains("Looking into it."));
        assert!(out.contains("The auth service"));
        assert!(!out.contains("resolved:"), "unresolved issue shows no resolved line");
    }

    #[test]
    fn render_text_without_optional_fields() {
        let show = ShowIssue {
            id: 1,
            title: "Minimal".into(),
            description: None,
            status: Status::Open,
            assignee_id: None,
            version: 1,
            created_at_us: 100,
            updated_at_us: 100,
            resolved_at_us: None,
            labels: vec![],
            comments: vec![],
        };
        let mut buf = Vec::new();
        render_show_text(&show, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Issue #1"));
        assert!(!out.contains("assignee:"));
        assert!(!out.contains("labels:"));
    }

    #[test]
    fn show_issue_json_omits_empty_optionals() {
        let show = ShowIssue {
            id: 1,
            title: "Minimal".into(),
            description: None,
            status: Status::Open,
            assignee_id: None,
            version: 1,
            created_at_us: 100,
            updated_at_us: 100,
            resolved_at_us: None,
            labels: vec![],
            comments: vec![],
        };
        let json = serde_json::to_string(&show).unwrap();
        assert!(json.contains("\"status\":\"OPEN\""));
        assert!(!json.contains("\"description\""));
        assert!(!json.contains("\"resolved_at_us\""));
    }

    fn init_project_with_issue() -> (tempfile::TempDir, i64) {
        let dir = tempfile::tempdir().unwrap();
        init::run_init(&init::InitArgs { force: false }, OutputMode::Text, dir.path())
            .expect("init");
        let mut conn =
            marrow_core::db::open_store(&dir.path().join(".marrow/marrow.db")).expect("open");
        let issue = create::create_issue(
            &mut conn,
            &NewIssue {
                title: "Auth bug".into(),
                description: Some("Details here.".into()),
                assignee_id: None,
                status: Status::Open,
            },
        )
        .expect("create");
        (dir, issue.id)
    }

    #[test]
    fn run_show_existing_issue() {
        let (dir, id) = init_project_with_issue();
        run_show(&ShowArgs { id }, OutputMode::Text, dir.path()).expect("show");
    }

    #[test]
    fn run_show_json_output() {
        let (dir, id) = init_project_with_issue();
        run_show(&ShowArgs { id }, OutputMode::Json, dir.path()).expect("show json");
    }

    #[test]
    fn run_show_not_found_returns_error() {
        let (dir, _id) = init_project_with_issue();
        assert!(run_show(&ShowArgs { id: 999 }, OutputMode::Text, dir.path()).is_err());
    }

    #[test]
    fn run_show_outside_project_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_show(&ShowArgs { id: 1 }, OutputMode::Text, dir.path()).is_err());
    }
}
