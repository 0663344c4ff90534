//! Errors from the lifecycle engine and worktree coordinator.

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("ticket '{id}' is not in 'todo' (or 'doing' with --force)")]
    NotStarted { id: String },

    #[error("ticket '{id}' is already started")]
    AlreadyStarted { id: String },

    #[error("ticket '{id}' is already closed")]
    AlreadyClosed { id: String },

    #[error("a reason is required to close '{id}': its branch is not merged into {base}")]
    ReasonRequired { id: String, base: String },

    #[error("more than one ticket is in 'doing': {ids:?}")]
    AmbiguousCurrent { ids: Vec<String> },

    #[error("init commands failed for '{id}': {failed:?}")]
    InitCommandsFailed { id: String, failed: Vec<String> },

    #[error("{0}")]
    InvalidContext(String),

    #[error(transparent)]
    Ticket(#[from] crate::ticket::TicketError),

    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WorkspaceError::NotStarted { .. } => ErrorCode::TicketNotStarted,
            WorkspaceError::AlreadyStarted { .. } => ErrorCode::TicketAlreadyStarted,
            WorkspaceError::AlreadyClosed { .. } => ErrorCode::TicketAlreadyClosed,
            WorkspaceError::ReasonRequired { .. } => ErrorCode::GitMergeFailed,
            WorkspaceError::AmbiguousCurrent { .. } => ErrorCode::InvalidContext,
            WorkspaceError::InitCommandsFailed { .. } => ErrorCode::InitCommandsFailed,
            WorkspaceError::InvalidContext(_) => ErrorCode::InvalidContext,
            WorkspaceError::Ticket(e) => e.code(),
            WorkspaceError::Git(e) => e.code(),
            WorkspaceError::Io(_) => ErrorCode::PermissionDenied,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            WorkspaceError::NotStarted { id } => vec![format!("run 'tf start {id}'")],
            WorkspaceError::AlreadyStarted { id } => {
                vec![format!("run 'tf show {id}' to see its current state")]
            }
            WorkspaceError::ReasonRequired { .. } => {
                vec!["pass --reason \"<why>\" to close without merging".into()]
            }
            WorkspaceError::AmbiguousCurrent { .. } => {
                vec!["close or move extra tickets out of 'doing' before restoring".into()]
            }
            WorkspaceError::Ticket(e) => e.suggestions(),
            WorkspaceError::Git(e) => e.suggestions(),
            _ => Vec::new(),
        }
    }
}
