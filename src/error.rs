//! Stable error codes and the top-level error type.
//!
//! Every user-visible error carries one of these machine-readable codes
//! plus a human message and a list of suggested next commands. The codes
//! are a stable wire contract: collaborators (the CLI's JSON envelope,
//! scripts driving TicketFlow) match on the string, not on the `Display`
//! text.

use std::fmt;

use crate::git::GitError;
use crate::ticket::TicketError;
use crate::workspace::WorkspaceError;

/// A stable, machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotGitRepo,
    ConfigNotFound,
    ConfigInvalid,
    PermissionDenied,
    TicketNotFound,
    TicketExists,
    TicketInvalid,
    TicketNotStarted,
    TicketAlreadyStarted,
    TicketAlreadyClosed,
    GitDirtyWorkspace,
    GitBranchExists,
    GitBranchDiverged,
    GitMergeFailed,
    WorktreeExists,
    WorktreeNotFound,
    WorktreeCreateFailed,
    WorktreeRemoveFailed,
    InitCommandsFailed,
    InvalidContext,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotGitRepo => "NOT_GIT_REPO",
            ErrorCode::ConfigNotFound => "CONFIG_NOT_FOUND",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::TicketNotFound => "TICKET_NOT_FOUND",
            ErrorCode::TicketExists => "TICKET_EXISTS",
            ErrorCode::TicketInvalid => "TICKET_INVALID",
            ErrorCode::TicketNotStarted => "TICKET_NOT_STARTED",
            ErrorCode::TicketAlreadyStarted => "TICKET_ALREADY_STARTED",
            ErrorCode::TicketAlreadyClosed => "TICKET_ALREADY_CLOSED",
            ErrorCode::GitDirtyWorkspace => "GIT_DIRTY_WORKSPACE",
            ErrorCode::GitBranchExists => "GIT_BRANCH_EXISTS",
            ErrorCode::GitBranchDiverged => "GIT_BRANCH_DIVERGED",
            ErrorCode::GitMergeFailed => "GIT_MERGE_FAILED",
            ErrorCode::WorktreeExists => "WORKTREE_EXISTS",
            ErrorCode::WorktreeNotFound => "WORKTREE_NOT_FOUND",
            ErrorCode::WorktreeCreateFailed => "WORKTREE_CREATE_FAILED",
            ErrorCode::WorktreeRemoveFailed => "WORKTREE_REMOVE_FAILED",
            ErrorCode::InitCommandsFailed => "INIT_COMMANDS_FAILED",
            ErrorCode::InvalidContext => "INVALID_CONTEXT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything TicketFlow's core can fail with, carrying a stable [`ErrorCode`]
/// and a list of suggested next commands for the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The stable wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Config(e) => e.code(),
            Error::Ticket(e) => e.code(),
            Error::Git(e) => e.code(),
            Error::Workspace(e) => e.code(),
            Error::Io(_) => ErrorCode::PermissionDenied,
            Error::Json(_) => ErrorCode::InvalidContext,
        }
    }

    /// Suggested next commands, rendered by the CLI as hints or a JSON array.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Config(e) => e.suggestions(),
            Error::Ticket(e) => e.suggestions(),
            Error::Git(e) => e.suggestions(),
            Error::Workspace(e) => e.suggestions(),
            Error::Io(_) => Vec::new(),
            Error::Json(_) => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
