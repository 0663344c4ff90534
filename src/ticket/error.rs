//! Ticket store error types.

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("ticket '{id}' not found")]
    NotFound { id: String },

    #[error("ticket '{id}' already exists")]
    AlreadyExists { id: String },

    #[error("'{slug}' is not a valid slug: must match [a-z0-9-]+")]
    InvalidSlug { slug: String },

    #[error("ticket '{id}' matches multiple files: {candidates:?}")]
    AmbiguousId { id: String, candidates: Vec<String> },

    #[error("ticket '{id}' is malformed: {reason}")]
    InvalidFormat { id: String, reason: String },

    #[error("ticket '{id}' is corrupted: {reason}")]
    Corrupted { id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TicketError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TicketError::NotFound { .. } => ErrorCode::TicketNotFound,
            TicketError::AlreadyExists { .. } => ErrorCode::TicketExists,
            TicketError::InvalidSlug { .. } | TicketError::InvalidFormat { .. } => {
                ErrorCode::TicketInvalid
            }
            TicketError::AmbiguousId { .. } => ErrorCode::TicketInvalid,
            TicketError::Corrupted { .. } => ErrorCode::TicketInvalid,
            TicketError::Io(_) => ErrorCode::PermissionDenied,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            TicketError::NotFound { .. } => vec!["run 'tf list --status all' to see known tickets".into()],
            TicketError::InvalidSlug { .. } => {
                vec!["use lowercase letters, digits, and hyphens only".into()]
            }
            TicketError::AmbiguousId { candidates, .. } => {
                vec![format!("specify the full id: one of {}", candidates.join(", "))]
            }
            TicketError::Corrupted { .. } => {
                vec!["inspect and fix the ticket's directory and timestamps by hand — this is never auto-corrected".into()]
            }
            _ => Vec::new(),
        }
    }
}
