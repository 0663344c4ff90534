//! The Lifecycle Engine — `Start`, `Close`, `Cleanup`, `Restore`,
//! `AutoCleanup`. This is the core of TicketFlow: it keeps a
//! ticket's directory, its branch, and its worktree in agreement, using the
//! ordered "git setup → file move → git commit → symlink" transaction with
//! rollback on failure before the commit.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::git::GitClient;
use crate::ticket::{Status, Ticket, TicketFilter, TicketStore, is_valid_id};

use super::current_link::CurrentLink;
use super::divergence::DivergencePolicy;
use super::worktree_coordinator::WorktreeCoordinator;
use super::WorkspaceError;

/// Constructs a [`GitClient`] bound to an arbitrary working directory
/// (the main repo root, or one of its worktrees). Injected so tests can
/// supply fakes without touching the filesystem beyond a temp dir.
pub type GitClientFactory = Box<dyn Fn(&Path) -> Result<Box<dyn GitClient>, crate::git::GitError>>;

pub struct StartResult {
    pub worktree_path: Option<PathBuf>,
    pub init_warning: Option<Vec<String>>,
    pub original_status: Status,
    pub recreating: bool,
}

pub struct CloseResult {
    pub id: String,
    pub cleared_current_link: bool,
}

pub struct CleanupResult {
    pub worktree_removed: bool,
    pub branch_removed: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AutoCleanupResult {
    pub stale_branches: usize,
    pub orphaned_worktrees: usize,
}

pub struct Engine {
    root: PathBuf,
    config: Config,
    store: TicketStore,
    git: Box<dyn GitClient>,
    git_factory: GitClientFactory,
    link: CurrentLink,
    worktrees: WorktreeCoordinator,
}

impl Engine {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Config,
        git: Box<dyn GitClient>,
        git_factory: GitClientFactory,
    ) -> Engine {
        let root = root.into();
        let store = TicketStore::new(root.clone(), config.tickets.clone());
        let link = CurrentLink::new(root.clone());
        let worktrees = WorktreeCoordinator::new(
            root.clone(),
            &config.worktree,
            std::time::Duration::from_secs(config.timeouts.init_commands),
        );
        Engine {
            root,
            config,
            store,
            git,
            git_factory,
            link,
            worktrees,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &TicketStore {
        &self.store
    }

    pub fn worktrees(&self) -> &WorktreeCoordinator {
        &self.worktrees
    }

    pub fn git(&self) -> &dyn GitClient {
        self.git.as_ref()
    }

    pub fn link(&self) -> &CurrentLink {
        &self.link
    }

    /// Transition a ticket from `todo` (or `doing`, with `force`) into
    /// `doing`: set up its branch and worktree, move its file, commit, and
    /// point `current-ticket.md` at it.
    pub fn start(
        &self,
        id_or_slug: &str,
        force: bool,
        policy: DivergencePolicy,
    ) -> Result<StartResult, WorkspaceError> {
        let mut ticket = self.store.locate(id_or_slug)?;
        let id = ticket.id.clone();
        let original_status = ticket.status();

        match original_status {
            Status::Todo => {}
            Status::Doing if force => {}
            _ => return Err(WorkspaceError::NotStarted { id }),
        }

        if !self.config.worktree.enabled {
            if self.git.has_uncommitted_changes()? {
                return Err(crate::git::GitError::DirtyWorkspace.into());
            }
            if self.git.branch_exists(&id)? {
                return Err(crate::git::GitError::BranchAlreadyExists { branch: id }.into());
            }
        }

        let default_branch = self.config.git.default_branch.clone();
        let mut recreating = false;
        let mut worktree_path = None;
        let mut init_warning = None;
        let mut created_branch = false;
        let mut previous_branch: Option<String> = None;

        if self.config.worktree.enabled {
            let worktree_exists = self.git.has_worktree(&id)?;
            if worktree_exists {
                if !force {
                    return Err(crate::git::GitError::WorktreeExists {
                        path: self.worktrees.path_for(&id),
                    }
                    .into());
                }
                if let Some(entry) = self.git.find_worktree_by_branch(&id)? {
                    self.worktrees.destroy(self.git.as_ref(), &entry.path, true)?;
                }
            }

            let branch_exists = self.git.branch_exists(&id)?;
            let mut create_branch = !branch_exists;
            let mut start_point: Option<String> = None;

            if branch_exists {
                let divergence = self.git.branch_diverged_from(&id, &default_branch)?;
                if divergence.diverged() {
                    match policy {
                        DivergencePolicy::Abort => {
                            return Err(crate::git::GitError::BranchDiverged {
                                branch: id,
                                base: default_branch,
                                ahead: divergence.ahead,
                                behind: divergence.behind,
                            }
                            .into());
                        }
                        DivergencePolicy::Recreate => {
                            self.git.delete_branch(&id, true)?;
                            create_branch = true;
                            start_point = Some(default_branch.clone());
                            recreating = true;
                        }
                        DivergencePolicy::UseAsIs => {}
                    }
                }
            }

            let (path, warning) = self.worktrees.create(
                self.git.as_ref(),
                &id,
                create_branch,
                start_point.as_deref(),
            )?;
            worktree_path = Some(path);
            init_warning = warning;
            created_branch = create_branch;
        } else {
            previous_branch = self.git.current_branch()?;
            self.git.checkout_new_branch(&id)?;
            created_branch = true;
        }

        // Ticket transition: todo/<id>.md -> doing/<id>.md, with rollback of
        // git setup if the rename fails.
        self.store.ensure_dirs()?;
        let old_path = ticket.path.clone();
        let new_path = self.store.dir_for(Status::Doing).join(format!("{id}.md"));

        if let Err(e) = std::fs::rename(&old_path, &new_path) {
            self.rollback_git_setup(&id, created_branch, worktree_path.as_deref(), previous_branch.as_deref());
            return Err(e.into());
        }

        ticket.path = new_path;
        ticket.front_matter.started_at = Some(chrono::Utc::now());
        if let Err(e) = self.store.update(&ticket) {
            let _ = std::fs::rename(&ticket.path, &old_path);
            self.rollback_git_setup(&id, created_branch, worktree_path.as_deref(), previous_branch.as_deref());
            return Err(e.into());
        }

        self.git.add(&[&ticket.path])?;
        let _ = self.git.add(&[&old_path]);
        self.git.commit(&format!("Start ticket: {id}"))?;

        self.link.set(&ticket)?;

        Ok(StartResult {
            worktree_path,
            init_warning,
            original_status,
            recreating,
        })
    }

    fn rollback_git_setup(
        &self,
        id: &str,
        created_branch: bool,
        worktree_path: Option<&Path>,
        previous_branch: Option<&str>,
    ) {
        match worktree_path {
            Some(path) => {
                let _ = self.worktrees.destroy(self.git.as_ref(), path, true);
            }
            // Branch-checkout mode: `checkout_new_branch` moved this client's
            // own HEAD onto `id`. Git refuses to delete the currently
            // checked-out branch, so check back out to whatever branch we
            // were on before deleting it.
            None => {
                if let Some(branch) = previous_branch {
                    let _ = self.git.checkout(branch);
                }
            }
        }
        if created_branch {
            let _ = self.git.delete_branch(id, true);
        }
    }

    /// `Close(reason)` against whatever ticket `current-ticket.md` points
    /// to, or `CloseByID(id, reason)` against a specific ticket.
    pub fn close(
        &self,
        id_or_slug: Option<&str>,
        reason: Option<&str>,
        force: bool,
    ) -> Result<CloseResult, WorkspaceError> {
        let current = self.link.resolve(&self.store);
        let ticket_id = match id_or_slug {
            Some(s) => self.store.locate(s)?.id,
            None => current
                .as_ref()
                .map(|t| t.id.clone())
                .ok_or_else(|| WorkspaceError::InvalidContext("no current ticket set".to_string()))?,
        };

        let mut ticket = self.store.locate(&ticket_id)?;
        match ticket.status() {
            Status::Doing => {}
            Status::Done => return Err(WorkspaceError::AlreadyClosed { id: ticket_id }),
            Status::Todo => return Err(WorkspaceError::NotStarted { id: ticket_id }),
        }

        let is_current = current.as_ref().map(|t| t.id == ticket_id).unwrap_or(false);

        if id_or_slug.is_some() && !is_current && reason.is_none() {
            let default_branch = self.config.git.default_branch.clone();
            if !self.git.is_branch_merged(&ticket_id, &default_branch)? {
                return Err(WorkspaceError::ReasonRequired {
                    id: ticket_id,
                    base: default_branch,
                });
            }
        }

        if is_current && !force {
            let dirty = match self.git.find_worktree_by_branch(&ticket_id)? {
                Some(entry) => (self.git_factory)(&entry.path)?.has_uncommitted_changes()?,
                None => {
                    let on_branch = self.git.current_branch()?.as_deref() == Some(ticket_id.as_str());
                    if !on_branch {
                        return Err(WorkspaceError::InvalidContext(format!(
                            "current branch is not '{ticket_id}'"
                        )));
                    }
                    self.git.has_uncommitted_changes()?
                }
            };
            if dirty {
                return Err(crate::git::GitError::DirtyWorkspace.into());
            }
        }

        ticket.front_matter.closed_at = Some(chrono::Utc::now());
        let mut commit_message = format!("Close ticket: {ticket_id}");
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            ticket.front_matter.closure_reason = Some(reason.to_string());
            if !ticket.content.ends_with('\n') && !ticket.content.is_empty() {
                ticket.content.push('\n');
            }
            ticket
                .content
                .push_str(&format!("\n## Closure Note\n\n{reason}\n"));
            commit_message.push_str(&format!("\n\nReason: {reason}"));
        }

        self.store.ensure_dirs()?;
        let old_path = ticket.path.clone();
        let new_path = self.store.dir_for(Status::Done).join(format!("{ticket_id}.md"));
        std::fs::rename(&old_path, &new_path)?;
        ticket.path = new_path;
        self.store.update(&ticket)?;

        self.git.add(&[&ticket.path])?;
        let _ = self.git.add(&[&old_path]);
        self.git.commit(&commit_message)?;

        let cleared = if is_current {
            self.link.clear()?;
            true
        } else {
            false
        };

        Ok(CloseResult {
            id: ticket_id,
            cleared_current_link: cleared,
        })
    }

    /// Post-merge tidying for a `done` ticket: remove its worktree (if any)
    /// and delete its branch. `force` here means the caller has already
    /// obtained confirmation; this engine never prompts.
    pub fn cleanup(&self, id_or_slug: &str) -> Result<CleanupResult, WorkspaceError> {
        let ticket = self.store.locate(id_or_slug)?;
        if ticket.status() != Status::Done {
            return Err(WorkspaceError::InvalidContext(format!(
                "ticket '{}' is not done",
                ticket.id
            )));
        }

        let worktree_removed = match self.git.find_worktree_by_branch(&ticket.id)? {
            Some(entry) => {
                self.worktrees.destroy(self.git.as_ref(), &entry.path, true)?;
                true
            }
            None => false,
        };
        let branch_removed = self.git.branch_exists(&ticket.id)?;
        self.git.delete_branch(&ticket.id, true)?;

        Ok(CleanupResult {
            worktree_removed,
            branch_removed,
        })
    }

    /// `Restore()` — rebuild `current-ticket.md` from whatever is uniquely
    /// in `doing/`.
    pub fn restore(&self) -> Result<Option<Ticket>, WorkspaceError> {
        let doing = self.store.enumerate(TicketFilter::Doing)?;
        match doing.len() {
            0 => {
                self.link.clear()?;
                Ok(None)
            }
            1 => {
                let ticket = doing.into_iter().next().unwrap();
                self.link.set(&ticket)?;
                Ok(Some(ticket))
            }
            _ => Err(WorkspaceError::AmbiguousCurrent {
                ids: doing.into_iter().map(|t| t.id).collect(),
            }),
        }
    }

    /// Sweep stale branches and orphaned worktrees left behind by tickets
    /// that were closed some other way. Pure when `dry_run` is true.
    pub fn auto_cleanup(&self, dry_run: bool) -> Result<AutoCleanupResult, WorkspaceError> {
        let all_tickets = self.store.enumerate(TicketFilter::All)?;
        let done_ids: std::collections::HashSet<String> = all_tickets
            .iter()
            .filter(|t| t.status() == Status::Done)
            .map(|t| t.id.clone())
            .collect();
        let known_ids: std::collections::HashSet<String> =
            all_tickets.iter().map(|t| t.id.clone()).collect();
        let default_branch = &self.config.git.default_branch;

        let mut result = AutoCleanupResult::default();

        for entry in self.git.list_worktrees()? {
            let Some(branch) = &entry.branch else { continue };
            if branch == default_branch {
                continue;
            }
            let orphaned = if is_valid_id(branch) {
                done_ids.contains(branch) || !known_ids.contains(branch)
            } else {
                false
            };
            if orphaned {
                result.orphaned_worktrees += 1;
                if !dry_run {
                    self.worktrees.destroy(self.git.as_ref(), &entry.path, true)?;
                }
            }
        }

        for branch in self.list_local_branches()? {
            if &branch == default_branch || !is_valid_id(&branch) {
                continue;
            }
            if done_ids.contains(&branch) {
                result.stale_branches += 1;
                if !dry_run {
                    self.git.delete_branch(&branch, true)?;
                }
            }
        }

        if !dry_run {
            self.worktrees.prune(self.git.as_ref())?;
        }

        Ok(result)
    }

    fn list_local_branches(&self) -> Result<Vec<String>, WorkspaceError> {
        let raw = self.git.exec(&["branch", "--format=%(refname:short)"])?;
        Ok(raw.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
    }
}
