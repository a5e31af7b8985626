#![forbid(unsafe_code)]

mod cmd;
mod output;
mod validate;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "marrow: SQLite-backed issue tracker with optimistic concurrency",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text, or json. Overrides --json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment, and TTY state.
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a marrow project",
        long_about = "Initialize a marrow project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    mw init\n\n    # Emit machine-readable output\n    mw init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Issues",
        about = "Create a new issue",
        long_about = "Create a new issue, optionally assigned and pre-statused.",
        after_help = "EXAMPLES:\n    # Create an open issue\n    mw create --title \"Fix login timeout\"\n\n    # Assign it while creating\n    mw create --title \"Fix login timeout\" --assignee 3\n\n    # Emit machine-readable output\n    mw create --title \"Fix login timeout\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Issues",
        about = "Show one issue",
        long_about = "Show full details for a single issue: fields, labels, and comments.",
        after_help = "EXAMPLES:\n    # Show an issue\n    mw show 7\n\n    # Emit machine-readable output\n    mw show 7 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Issues",
        about = "List issues",
        long_about = "List issues with optional filters, sort order, and paging.",
        after_help = "EXAMPLES:\n    # List recently updated issues\n    mw list\n\n    # Filter by status and label\n    mw list --status open --label backend\n\n    # Emit machine-readable output\n    mw list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Issues",
        about = "Update an issue with optimistic locking",
        long_about = "Apply a partial edit to an issue. The write is refused if the stored version no longer matches --expect-version.",
        after_help = "EXAMPLES:\n    # Rename, expecting version 1\n    mw update 7 --expect-version 1 --title \"New title\"\n\n    # Clear the description\n    mw update 7 --expect-version 2 --clear-description\n\n    # Close it\n    mw update 7 --expect-version 3 --status closed"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Metadata",
        about = "Manage issue labels",
        long_about = "Replace an issue's label set, or list all labels with usage counts."
    )]
    Label {
        #[command(subcommand)]
        command: cmd::label::LabelCommand,
    },

    #[command(
        next_help_heading = "Issues",
        about = "Set a status across many issues",
        long_about = "Set one status on several issues in a single all-or-nothing batch.",
        after_help = "EXAMPLES:\n    # Close three issues at once\n    mw status closed 4 9 12\n\n    # Emit machine-readable output\n    mw status closed 4 9 12 --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Interoperability",
        about = "Import issues from a JSON Lines file",
        long_about = "Bulk-load issues from a JSON Lines file. Rows failing validation are reported and skipped; the rest insert in one transaction.",
        after_help = "EXAMPLES:\n    # Import a JSONL export\n    mw import issues.jsonl\n\n    # Emit machine-readable output\n    mw import issues.jsonl --json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "Project statistics",
        long_about = "Show status counts and the average resolution latency.",
        after_help = "EXAMPLES:\n    # Show project stats\n    mw stats\n\n    # Emit machine-readable output\n    mw stats --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Metadata",
        about = "Comment on issues",
        long_about = "Add an immutable comment to an issue, or list an issue's comments."
    )]
    Comment {
        #[command(subcommand)]
        command: cmd::comment::CommentCommand,
    },

    #[command(
        next_help_heading = "Project",
        about = "Manage users",
        long_about = "Register users and list them. Emails must be unique."
    )]
    User {
        #[command(subcommand)]
        command: cmd::user::UserCommand,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MARROW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "marrow=debug,info"
        } else {
            "marrow=info,warn"
        })
    });

    let format = env::var("MARROW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = std::env::current_dir()?;
    let output = cli.output_mode();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &project_root),
        Commands::Create(ref args) => cmd::create::run_create(args, output, quiet, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &project_root),
        Commands::List(ref args) => cmd::list::run_list(args, output, &project_root),
        Commands::Update(ref args) => cmd::update::run_update(args, output, quiet, &project_root),
        Commands::Label { ref command } => match command {
            cmd::label::LabelCommand::Set(args) => {
                cmd::label::run_label_set(args, output, quiet, &project_root)
            }
            cmd::label::LabelCommand::Ls(args) => {
                cmd::label::run_label_ls(args, output, &project_root)
            }
        },
        Commands::Status(ref args) => cmd::status::run_status(args, output, quiet, &project_root),
        Commands::Import(ref args) => cmd::import::run_import(args, output, &project_root),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, output, &project_root),
        Commands::Comment { ref command } => match command {
            cmd::comment::CommentCommand::Add(args) => {
                cmd::comment::run_comment_add(args, output, quiet, &project_root)
            }
            cmd::comment::CommentCommand::Ls(args) => {
                cmd::comment::run_comment_ls(args, output, &project_root)
            }
        },
        Commands::User { ref command } => match command {
            cmd::user::UserCommand::Add(args) => {
                cmd::user::run_user_add(args, output, quiet, &project_root)
            }
            cmd::user::UserCommand::Ls(args) => cmd::user::run_user_ls(args, output, &project_root),
        },
    }
}
