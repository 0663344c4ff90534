//! `tf` — the TicketFlow CLI.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use cli::{Cli, Cmd, Format, StatusArg, WorktreeCmd};
use serde::Serialize;
use serde_json::json;

use ticketflow::config::{Config, CONFIG_FILE_NAME};
use ticketflow::git::{GitClient, ProcessGitClient};
use ticketflow::ticket::{Ticket, TicketFilter, TicketStore};
use ticketflow::workspace::{non_interactive_default, Engine, GitClientFactory, WorkspaceError};
use ticketflow::Error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let json_mode = cli.json;

    match run(&cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            if json_mode {
                let envelope = json!({
                    "error": {
                        "code": err.code().as_str(),
                        "message": err.to_string(),
                        "details": serde_json::Value::Null,
                        "suggestions": err.suggestions(),
                    }
                });
                eprintln!("{}", serde_json::to_string_pretty(&envelope).unwrap());
            } else {
                eprintln!("error: {err}");
                for suggestion in err.suggestions() {
                    eprintln!("  hint: {suggestion}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, Error> {
    let start_dir = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    if matches!(cli.command, Cmd::Init) {
        return init(&start_dir, cli.json);
    }

    let root = find_repo_root(&start_dir)?;
    let config = Config::load(&root)?;
    let engine = build_engine(&root, &config)?;
    let format = resolve_format(cli.json, config.output.default_format);

    match &cli.command {
        Cmd::Init => unreachable!(),
        Cmd::New { slug, parent, priority, description } => {
            new_ticket(&engine, slug, parent.as_deref(), *priority, description.as_deref(), format)
        }
        Cmd::List { status, count, format: fmt_override } => {
            list(&engine, *status, *count, fmt_override.unwrap_or(format))
        }
        Cmd::Show { id } => show(&engine, id, format),
        Cmd::Start { id, force } => start(&engine, id, *force, format),
        Cmd::Close { id, reason, force } => close(&engine, id.as_deref(), reason.as_deref(), *force, format),
        Cmd::Restore => restore(&engine, format),
        Cmd::Cleanup { id, force, auto, dry_run } => {
            cleanup(&engine, id.as_deref(), *force, *auto, *dry_run, format)
        }
        Cmd::Worktree { command } => worktree(&engine, command, format),
        Cmd::Status { format: fmt_override } => status(&engine, fmt_override.unwrap_or(format)),
    }
}

fn resolve_format(json_flag: bool, default: ticketflow::config::OutputFormat) -> Format {
    if json_flag {
        return Format::Json;
    }
    match default {
        ticketflow::config::OutputFormat::Json => Format::Json,
        ticketflow::config::OutputFormat::Text => Format::Text,
    }
}

fn find_repo_root(start: &Path) -> Result<PathBuf, Error> {
    let client = ProcessGitClient::at(start, Duration::from_secs(30)).map_err(WorkspaceError::from)?;
    Ok(dunce::simplified(client.root_path()).to_path_buf())
}

fn build_engine(root: &Path, config: &Config) -> Result<Engine, Error> {
    let timeout = Duration::from_secs(config.timeouts.git);
    let git: Box<dyn GitClient> =
        Box::new(ProcessGitClient::at(root, timeout).map_err(WorkspaceError::from)?);
    let factory: GitClientFactory = Box::new(move |p| {
        ProcessGitClient::at(p, timeout).map(|c| Box::new(c) as Box<dyn GitClient>)
    });
    Ok(Engine::new(root, config.clone(), git, factory))
}

fn init(start: &Path, json_mode: bool) -> Result<String, Error> {
    let client = ProcessGitClient::at(start, Duration::from_secs(30)).map_err(WorkspaceError::from)?;
    let repo_root = client.root_path().to_path_buf();

    let config = Config::default();
    if !repo_root.join(CONFIG_FILE_NAME).exists() {
        config.write(&repo_root)?;
    }

    let store = TicketStore::new(&repo_root, config.tickets.clone());
    store.ensure_dirs()?;

    let gitignore_path = repo_root.join(".gitignore");
    let existing = std::fs::read_to_string(&gitignore_path).unwrap_or_default();
    if !existing.lines().any(|l| l.trim() == "current-ticket.md") {
        let mut updated = existing;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str("current-ticket.md\n");
        std::fs::write(&gitignore_path, updated)?;
    }

    if json_mode {
        Ok(format!("{}\n", json!({"status": "ok", "root": repo_root})))
    } else {
        Ok(format!("Initialized TicketFlow in {}\n", repo_root.display()))
    }
}

fn new_ticket(
    engine: &Engine,
    slug: &str,
    parent: Option<&str>,
    priority: i32,
    description: Option<&str>,
    format: Format,
) -> Result<String, Error> {
    let mut related = Vec::new();
    if let Some(parent) = parent {
        engine.store().locate(parent)?;
        related.push(format!("parent:{parent}"));
    }
    let description = description.unwrap_or(slug);
    let ticket = engine.store().create(slug, description, priority, related)?;
    match format {
        Format::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&ticket_json(&ticket))?)),
        Format::Text => Ok(format!("Created {}\n", ticket.id)),
    }
}

#[derive(Serialize)]
struct TicketJson<'a> {
    id: &'a str,
    status: &'a str,
    priority: i32,
    description: &'a str,
    created_at: String,
    started_at: Option<String>,
    closed_at: Option<String>,
    closure_reason: Option<&'a str>,
    related: &'a [String],
}

fn ticket_json(ticket: &Ticket) -> TicketJson<'_> {
    TicketJson {
        id: &ticket.id,
        status: ticket.status().as_str(),
        priority: ticket.front_matter.priority,
        description: &ticket.front_matter.description,
        created_at: ticket.front_matter.created_at.to_rfc3339(),
        started_at: ticket.front_matter.started_at.map(|t| t.to_rfc3339()),
        closed_at: ticket.front_matter.closed_at.map(|t| t.to_rfc3339()),
        closure_reason: ticket.front_matter.closure_reason.as_deref(),
        related: &ticket.front_matter.related,
    }
}

fn list(engine: &Engine, status: StatusArg, count: Option<usize>, format: Format) -> Result<String, Error> {
    let filter = match status {
        StatusArg::Todo => TicketFilter::Todo,
        StatusArg::Doing => TicketFilter::Doing,
        StatusArg::Done => TicketFilter::Done,
        StatusArg::Active => TicketFilter::Active,
        StatusArg::All => TicketFilter::All,
    };
    let mut tickets = engine.store().enumerate(filter)?;
    if let Some(count) = count {
        tickets.truncate(count);
    }

    match format {
        Format::Json => {
            let values: Vec<_> = tickets.iter().map(ticket_json).collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&values)?))
        }
        Format::Text => {
            let mut out = String::new();
            for ticket in &tickets {
                out.push_str(&format!(
                    "{}  [{}] p{} {}\n",
                    ticket.id,
                    ticket.status(),
                    ticket.front_matter.priority,
                    ticket.front_matter.description
                ));
            }
            Ok(out)
        }
    }
}

fn show(engine: &Engine, id: &str, format: Format) -> Result<String, Error> {
    let ticket = engine.store().locate(id)?;
    match format {
        Format::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&ticket_json(&ticket))?)),
        Format::Text => Ok(ticket.serialize().map_err(WorkspaceError::from)?),
    }
}

fn start(engine: &Engine, id: &str, force: bool, format: Format) -> Result<String, Error> {
    let result = engine.start(id, force, non_interactive_default())?;
    match format {
        Format::Json => Ok(format!(
            "{}\n",
            json!({
                "worktreePath": result.worktree_path,
                "initWarning": result.init_warning,
                "originalStatus": result.original_status.as_str(),
                "recreating": result.recreating,
            })
        )),
        Format::Text => {
            let mut out = format!("Started {id}\n");
            if let Some(path) = &result.worktree_path {
                out.push_str(&format!("Worktree: {}\n", path.display()));
            }
            if result.recreating {
                out.push_str("Branch had diverged and was recreated from the default branch.\n");
            }
            if let Some(failed) = &result.init_warning {
                out.push_str(&format!("Warning: init commands failed: {}\n", failed.join(", ")));
            }
            Ok(out)
        }
    }
}

fn close(
    engine: &Engine,
    id: Option<&str>,
    reason: Option<&str>,
    force: bool,
    format: Format,
) -> Result<String, Error> {
    let result = engine.close(id, reason, force)?;
    match format {
        Format::Json => Ok(format!(
            "{}\n",
            json!({"id": result.id, "clearedCurrentLink": result.cleared_current_link})
        )),
        Format::Text => Ok(format!("Closed {}\n", result.id)),
    }
}

fn restore(engine: &Engine, format: Format) -> Result<String, Error> {
    let ticket = engine.restore()?;
    match format {
        Format::Json => Ok(format!("{}\n", json!({"current": ticket.map(|t| t.id)}))),
        Format::Text => Ok(match ticket {
            Some(t) => format!("current-ticket.md -> {}\n", t.id),
            None => "current-ticket.md removed (no ticket in doing/)\n".to_string(),
        }),
    }
}

fn cleanup(
    engine: &Engine,
    id: Option<&str>,
    _force: bool,
    auto: bool,
    dry_run: bool,
    format: Format,
) -> Result<String, Error> {
    if auto {
        let result = engine.auto_cleanup(dry_run)?;
        return Ok(match format {
            Format::Json => format!(
                "{}\n",
                json!({"staleBranches": result.stale_branches, "orphanedWorktrees": result.orphaned_worktrees})
            ),
            Format::Text => format!(
                "stale branches: {}\norphaned worktrees: {}\n",
                result.stale_branches, result.orphaned_worktrees
            ),
        });
    }

    let id = id.ok_or_else(|| {
        Error::from(WorkspaceError::InvalidContext("cleanup requires an id, or --auto".to_string()))
    })?;
    let result = engine.cleanup(id)?;
    Ok(match format {
        Format::Json => format!(
            "{}\n",
            json!({"worktreeRemoved": result.worktree_removed, "branchRemoved": result.branch_removed})
        ),
        Format::Text => format!(
            "Cleaned up {id} (worktree removed: {}, branch removed: {})\n",
            result.worktree_removed, result.branch_removed
        ),
    })
}

fn worktree(engine: &Engine, command: &WorktreeCmd, format: Format) -> Result<String, Error> {
    match command {
        WorktreeCmd::List => {
            let entries = engine.worktrees().list(engine.git()).map_err(Error::from)?;
            match format {
                Format::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&entries)?)),
                Format::Text => {
                    let mut out = String::new();
                    for e in &entries {
                        out.push_str(&format!("{}  {}\n", e.path.display(), e.branch.as_deref().unwrap_or("-")));
                    }
                    Ok(out)
                }
            }
        }
        WorktreeCmd::Clean { dry_run } => {
            let result = engine.auto_cleanup(*dry_run)?;
            Ok(match format {
                Format::Json => format!("{}\n", json!({"orphanedWorktrees": result.orphaned_worktrees})),
                Format::Text => format!("orphaned worktrees: {}\n", result.orphaned_worktrees),
            })
        }
    }
}

fn status(engine: &Engine, format: Format) -> Result<String, Error> {
    let current = engine.link().resolve(engine.store());
    match format {
        Format::Json => Ok(format!("{}\n", json!({"current": current.as_ref().map(ticket_json)}))),
        Format::Text => Ok(match current {
            Some(t) => format!("On ticket {} ({})\n", t.id, t.status()),
            None => "No current ticket\n".to_string(),
        }),
    }
}
