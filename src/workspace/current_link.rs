//! The `current-ticket.md` symlink — a non-authoritative hint pointing at
//! the active ticket, maintained by the lifecycle engine.
//!
//! **Invariant**: [`CurrentLink::clear`] must only be called when closing
//! the ticket the link points to. Closing any other ticket must leave it
//! untouched — callers enforce this by checking [`CurrentLink::resolve`]
//! before clearing, not by clearing unconditionally.

use std::path::{Path, PathBuf};

use pathdiff::diff_paths;

use crate::ticket::{Ticket, TicketStore};
use crate::workspace::WorkspaceError;

pub const LINK_NAME: &str = "current-ticket.md";

pub struct CurrentLink {
    root: PathBuf,
}

impl CurrentLink {
    pub fn new(root: impl Into<PathBuf>) -> CurrentLink {
        CurrentLink { root: root.into() }
    }

    fn link_path(&self) -> PathBuf {
        self.root.join(LINK_NAME)
    }

    /// Point the link at `ticket`, replacing any existing link.
    pub fn set(&self, ticket: &Ticket) -> Result<(), WorkspaceError> {
        let target = diff_paths(&ticket.path, &self.root).unwrap_or_else(|| ticket.path.clone());
        self.clear()?;
        symlink(&target, &self.link_path())?;
        Ok(())
    }

    /// Remove the link if present; tolerates absence.
    pub fn clear(&self) -> Result<(), WorkspaceError> {
        let path = self.link_path();
        match std::fs::symlink_metadata(&path) {
            Ok(_) => {
                std::fs::remove_file(&path)?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Dereference the link and load the ticket it points to, or `None` if
    /// the link is absent, broken, or not inside `doing/`.
    pub fn resolve(&self, store: &TicketStore) -> Option<Ticket> {
        let link = self.link_path();
        let target = std::fs::read_link(&link).ok()?;
        let absolute = if target.is_absolute() {
            target
        } else {
            self.root.join(target)
        };
        let id = absolute.file_stem()?.to_str()?;
        store.locate(id).ok()
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
