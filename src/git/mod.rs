//! Git capability — the fixed interface the lifecycle engine depends on.
//!
//! The core never spawns `git` directly; it goes through [`GitClient`], so
//! tests can swap in an in-process fake bound to a real throwaway
//! repository without mocking individual calls. [`ProcessGitClient`] is the
//! only implementation shipped here, wrapping the real `git` binary.

mod error;
mod parse;
mod process;

pub use error::GitError;
pub use process::ProcessGitClient;

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One entry from `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub head: String,
}

/// Result of comparing a branch against a base ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    pub ahead: usize,
    pub behind: usize,
}

impl Divergence {
    /// True when the branch is both ahead of and behind its base.
    pub fn diverged(self) -> bool {
        self.ahead > 0 && self.behind > 0
    }
}

/// The git capability consumed by the lifecycle engine.
///
/// Every method is bound to a fixed working directory supplied at
/// construction time (the main repository root, or a specific worktree —
/// see [`ProcessGitClient::at`]).
pub trait GitClient {
    /// Run an arbitrary git subcommand, returning trimmed stdout.
    fn exec(&self, args: &[&str]) -> Result<String, GitError>;

    /// Absolute path of the **main** repository's working tree — the parent
    /// of git's common directory, not necessarily this client's own cwd.
    /// Stable across worktrees: calling this from inside a linked worktree
    /// still returns the main repo's root, so sibling worktrees are always
    /// placed next to it rather than nested inside the current one.
    fn root_path(&self) -> &Path;

    /// `None` in detached-HEAD state.
    fn current_branch(&self) -> Result<Option<String>, GitError>;

    fn has_uncommitted_changes(&self) -> Result<bool, GitError>;

    fn add(&self, paths: &[&Path]) -> Result<(), GitError>;

    fn commit(&self, message: &str) -> Result<(), GitError>;

    fn checkout(&self, reference: &str) -> Result<(), GitError>;

    fn checkout_new_branch(&self, name: &str) -> Result<(), GitError>;

    fn create_branch(&self, name: &str, start_point: &str) -> Result<(), GitError>;

    fn branch_exists(&self, name: &str) -> Result<bool, GitError>;

    fn delete_branch(&self, name: &str, force: bool) -> Result<(), GitError>;

    /// `git branch --merged <base>` semantics: true if every commit on
    /// `branch` is already reachable from `base`.
    fn is_branch_merged(&self, branch: &str, base: &str) -> Result<bool, GitError>;

    /// Ahead/behind counts of `branch` relative to `base`, via
    /// `merge-base --is-ancestor` plus `rev-list --count`.
    fn branch_diverged_from(&self, branch: &str, base: &str) -> Result<Divergence, GitError>;

    fn has_worktree(&self, id: &str) -> Result<bool, GitError>;

    /// `create_branch`: when true, create `branch` at `start_point` as part
    /// of adding the worktree (`git worktree add -b`); when false, the
    /// branch must already exist.
    fn add_worktree(
        &self,
        path: &Path,
        branch: &str,
        create_branch: bool,
        start_point: Option<&str>,
    ) -> Result<(), GitError>;

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), GitError>;

    fn prune_worktrees(&self) -> Result<(), GitError>;

    fn list_worktrees(&self) -> Result<Vec<WorktreeEntry>, GitError>;

    fn find_worktree_by_branch(&self, branch: &str) -> Result<Option<WorktreeEntry>, GitError>;
}
