//! Git error types.

use std::path::PathBuf;

use crate::error::ErrorCode;

/// Everything that can go wrong talking to `git`.
///
/// Variants that represent precondition violations carry enough context to
/// render a hint; variants that wrap a raw subprocess failure
/// keep git's own stderr so callers can show it verbatim.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    #[error("git {args} failed: {stderr}")]
    CommandFailed { args: String, stderr: String },

    #[error("git {args} timed out after {timeout_secs}s")]
    TimedOut { args: String, timeout_secs: u64 },

    #[error("working tree has uncommitted changes")]
    DirtyWorkspace,

    #[error("branch '{branch}' already exists")]
    BranchAlreadyExists { branch: String },

    #[error("branch '{branch}' has diverged from '{base}' (ahead {ahead}, behind {behind})")]
    BranchDiverged {
        branch: String,
        base: String,
        ahead: usize,
        behind: usize,
    },

    #[error("failed to merge branch '{branch}': {reason}")]
    MergeFailed { branch: String, reason: String },

    #[error("worktree already exists at {path}")]
    WorktreeExists { path: PathBuf },

    #[error("no worktree found for branch '{branch}'")]
    WorktreeNotFound { branch: String },

    #[error("failed to create worktree for '{branch}': {reason}")]
    WorktreeCreateFailed { branch: String, reason: String },

    #[error("failed to remove worktree at {path}: {reason}")]
    WorktreeRemoveFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GitError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GitError::NotARepo { .. } => ErrorCode::NotGitRepo,
            GitError::CommandFailed { .. } | GitError::TimedOut { .. } => {
                ErrorCode::InvalidContext
            }
            GitError::DirtyWorkspace => ErrorCode::GitDirtyWorkspace,
            GitError::BranchAlreadyExists { .. } => ErrorCode::GitBranchExists,
            GitError::BranchDiverged { .. } => ErrorCode::GitBranchDiverged,
            GitError::MergeFailed { .. } => ErrorCode::GitMergeFailed,
            GitError::WorktreeExists { .. } => ErrorCode::WorktreeExists,
            GitError::WorktreeNotFound { .. } => ErrorCode::WorktreeNotFound,
            GitError::WorktreeCreateFailed { .. } => ErrorCode::WorktreeCreateFailed,
            GitError::WorktreeRemoveFailed { .. } => ErrorCode::WorktreeRemoveFailed,
            GitError::Io(_) => ErrorCode::PermissionDenied,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GitError::NotARepo { .. } => vec!["run 'git init' first".into()],
            GitError::DirtyWorkspace => {
                vec!["commit or stash your changes, or pass --force".into()]
            }
            GitError::BranchAlreadyExists { branch } => {
                vec![format!("run 'git checkout {branch}'")]
            }
            GitError::WorktreeExists { .. } => vec!["pass --force to recreate it".into()],
            GitError::WorktreeNotFound { branch } => {
                vec![format!("run 'tf worktree list' to see active worktrees for {branch}")]
            }
            _ => Vec::new(),
        }
    }
}
