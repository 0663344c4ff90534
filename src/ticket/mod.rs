//! The ticket file format: front matter, status derivation, and parsing.

mod error;
mod store;

pub use error::TicketError;
pub use store::{TicketFilter, TicketStore};

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// `YYMMDD-HHMMSS-<slug>`.
fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{6})-(\d{6})-([a-z0-9-]+)$").unwrap())
}

fn slug_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").unwrap())
}

/// Returns `true` when `id` matches `YYMMDD-HHMMSS-<slug>`.
pub fn is_valid_id(id: &str) -> bool {
    id_pattern().is_match(id)
}

/// Returns `true` when `slug` matches `[a-z0-9-]+`.
pub fn is_valid_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

/// A ticket's position in the lifecycle, derived from (directory,
/// `started_at`, `closed_at`) — never stored directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Todo,
    Doing,
    Done,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        }
    }

    /// Derives a status from the front matter's timestamps alone, rejecting
    /// the one combination that can never arise from a valid lifecycle
    /// transition: a closed ticket that was never started.
    fn derive(started_at: Option<DateTime<Utc>>, closed_at: Option<DateTime<Utc>>) -> Result<Status, String> {
        match (started_at, closed_at) {
            (None, None) => Ok(Status::Todo),
            (Some(_), None) => Ok(Status::Doing),
            (Some(_), Some(_)) => Ok(Status::Done),
            (None, Some(_)) => Err("closed_at is set but started_at is not".to_string()),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The YAML front matter, kept separate from [`Ticket`] so unknown keys can
/// be preserved verbatim on round-trip via `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontMatter {
    pub priority: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_reason: Option<String>,
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A parsed ticket: front matter plus body plus the derived identity the
/// store attaches (id from filename, path from location).
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub front_matter: FrontMatter,
    pub content: String,
    pub path: PathBuf,
}

impl Ticket {
    /// Status derived from the front matter's timestamps. Does not consult
    /// the containing directory — callers compare the two to detect the
    /// corruption described by the directory/timestamp invariant.
    pub fn status(&self) -> Status {
        match (self.front_matter.started_at, self.front_matter.closed_at) {
            (None, None) => Status::Todo,
            (Some(_), None) => Status::Doing,
            (Some(_), Some(_)) => Status::Done,
            (None, Some(_)) => Status::Done,
        }
    }

    /// Split `<id>.md` into its front matter block and body; fails if fewer
    /// than two `---` fence lines are present or the YAML is malformed.
    pub fn parse(id: &str, raw: &str, path: PathBuf) -> Result<Ticket, TicketError> {
        let mut lines = raw.lines();
        let first = lines.next().unwrap_or("");
        if first.trim() != "---" {
            return Err(TicketError::InvalidFormat {
                id: id.to_string(),
                reason: "missing opening '---' fence".to_string(),
            });
        }

        let rest = &raw[first.len()..];
        let rest = rest.strip_prefix('\n').unwrap_or(rest);

        let fence_end = rest
            .find("\n---")
            .ok_or_else(|| TicketError::InvalidFormat {
                id: id.to_string(),
                reason: "missing closing '---' fence".to_string(),
            })?;

        let yaml = &rest[..fence_end];
        // `after_fence` starts right after the closing fence's `---` token,
        // i.e. mid-line: first the rest of that fence line (normally
        // nothing), then the newline ending it, then the blank separator
        // line `serialize` always inserts before the body. Consume the
        // fence line itself before stripping that one separator newline.
        let after_fence = &rest[fence_end + "\n---".len()..];
        let fence_line_end = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
        let after_fence_line = &after_fence[fence_line_end..];
        let body = after_fence_line.strip_prefix('\n').unwrap_or(after_fence_line);

        let front_matter: FrontMatter =
            serde_yaml::from_str(yaml).map_err(|e| TicketError::InvalidFormat {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Ticket {
            id: id.to_string(),
            front_matter,
            content: body.to_string(),
            path,
        })
    }

    /// Checks the timestamp-derived status against `expected` (the directory
    /// the ticket was found in). A mismatch — including the invalid
    /// `started_at: null, closed_at: <set>` combination — is a corruption to
    /// be reported, never silently corrected.
    pub fn check_consistency(&self, expected: Status) -> Result<(), TicketError> {
        let derived = Status::derive(self.front_matter.started_at, self.front_matter.closed_at).map_err(
            |reason| TicketError::Corrupted {
                id: self.id.clone(),
                reason,
            },
        )?;
        if derived != expected {
            return Err(TicketError::Corrupted {
                id: self.id.clone(),
                reason: format!("found in '{expected}' directory but timestamps say '{derived}'"),
            });
        }
        Ok(())
    }

    /// Inverse of [`Ticket::parse`]: `---\n<yaml>---\n\n<body>`.
    pub fn serialize(&self) -> Result<String, TicketError> {
        let yaml = serde_yaml::to_string(&self.front_matter).map_err(|e| TicketError::InvalidFormat {
            id: self.id.clone(),
            reason: e.to_string(),
        })?;
        Ok(format!("---\n{yaml}---\n\n{}", self.content))
    }
}
