//! The `tf` command-line surface — argument parsing only; all behavior
//! lives in [`ticketflow::workspace::Engine`] and friends.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Color, Styles};
use clap::{Parser, Subcommand, ValueEnum};

fn help_styles() -> Styles {
    Styles::styled()
        .header(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .usage(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .literal(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .placeholder(anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Todo,
    Doing,
    Done,
    Active,
    All,
}

#[derive(Parser)]
#[command(name = "tf")]
#[command(about = "Local, git-native ticket management", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(styles = help_styles())]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "path")]
    pub directory: Option<PathBuf>,

    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Initialize TicketFlow in the current git repository
    Init,

    /// Create a new ticket
    New {
        slug: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value_t = 2)]
        priority: i32,
        #[arg(long)]
        description: Option<String>,
    },

    /// List tickets
    List {
        #[arg(long, value_enum, default_value_t = StatusArg::Active)]
        status: StatusArg,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, value_enum)]
        format: Option<Format>,
    },

    /// Show a single ticket
    Show { id: String },

    /// Start work on a ticket
    Start {
        id: String,
        #[arg(long)]
        force: bool,
    },

    /// Close the current ticket, or a specific one by id
    Close {
        id: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        force: bool,
    },

    /// Rebuild the current-ticket link
    Restore,

    /// Remove a done ticket's branch and worktree
    Cleanup {
        id: Option<String>,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        auto: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Worktree inspection and bulk cleanup
    Worktree {
        #[command(subcommand)]
        command: WorktreeCmd,
    },

    /// Show the current ticket and branch
    Status {
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

#[derive(Subcommand)]
pub enum WorktreeCmd {
    /// List active worktrees
    List,
    /// Remove orphaned worktrees and their stale branches
    Clean {
        #[arg(long)]
        dry_run: bool,
    },
}
