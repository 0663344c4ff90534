//! Locate, enumerate, create, and update ticket files on disk.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::TicketsConfig;

use super::{FrontMatter, Status, Ticket, TicketError, is_valid_slug};

/// Which tickets [`TicketStore::enumerate`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketFilter {
    Todo,
    Doing,
    Done,
    /// `todo` and `doing`.
    Active,
    All,
}

impl TicketFilter {
    fn includes(self, status: Status) -> bool {
        match self {
            TicketFilter::Todo => status == Status::Todo,
            TicketFilter::Doing => status == Status::Doing,
            TicketFilter::Done => status == Status::Done,
            TicketFilter::Active => status == Status::Todo || status == Status::Doing,
            TicketFilter::All => true,
        }
    }
}

pub struct TicketStore {
    root: PathBuf,
    config: TicketsConfig,
}

impl TicketStore {
    pub fn new(root: impl Into<PathBuf>, config: TicketsConfig) -> TicketStore {
        TicketStore {
            root: root.into(),
            config,
        }
    }

    pub fn dir_for(&self, status: Status) -> PathBuf {
        match status {
            Status::Todo => self.config.todo_path(&self.root),
            Status::Doing => self.config.doing_path(&self.root),
            Status::Done => self.config.done_path(&self.root),
        }
    }

    /// Create `tickets/{todo,doing,done}` if absent. Idempotent.
    pub fn ensure_dirs(&self) -> Result<(), TicketError> {
        for status in [Status::Todo, Status::Doing, Status::Done] {
            std::fs::create_dir_all(self.dir_for(status))?;
        }
        Ok(())
    }

    /// Resolve `id_or_slug` to a ticket file. Accepts an exact `<id>.md`
    /// match in any of the three directories, or — if `id_or_slug` isn't a
    /// full id — a bare slug resolved via `*-<slug>.md` glob; ambiguous
    /// matches fail with [`TicketError::AmbiguousId`].
    pub fn locate(&self, id_or_slug: &str) -> Result<Ticket, TicketError> {
        for status in [Status::Todo, Status::Doing, Status::Done] {
            let candidate = self.dir_for(status).join(format!("{id_or_slug}.md"));
            if candidate.is_file() {
                return self.load(id_or_slug, &candidate, status);
            }
        }

        let pattern_suffix = format!("*-{id_or_slug}.md");
        let mut matches: Vec<(String, PathBuf, Status)> = Vec::new();
        for status in [Status::Todo, Status::Doing, Status::Done] {
            let dir = self.dir_for(status);
            let pattern = dir.join(&pattern_suffix);
            let Some(pattern_str) = pattern.to_str() else { continue };
            for entry in glob::glob(pattern_str).into_iter().flatten().flatten() {
                if let Some(stem) = entry.file_stem().and_then(|s| s.to_str()) {
                    matches.push((stem.to_string(), entry.clone(), status));
                }
            }
        }

        match matches.len() {
            0 => Err(TicketError::NotFound {
                id: id_or_slug.to_string(),
            }),
            1 => {
                let (id, path, status) = matches.remove(0);
                self.load(&id, &path, status)
            }
            _ => Err(TicketError::AmbiguousId {
                id: id_or_slug.to_string(),
                candidates: matches.into_iter().map(|(id, ..)| id).collect(),
            }),
        }
    }

    /// Parses the file at `path` and checks its timestamp-derived status
    /// against `expected` (the directory it was found in), surfacing any
    /// mismatch as [`TicketError::Corrupted`] rather than silently trusting
    /// whichever directory happened to hold the file.
    fn load(&self, id: &str, path: &Path, expected: Status) -> Result<Ticket, TicketError> {
        let raw = std::fs::read_to_string(path)?;
        let ticket = Ticket::parse(id, &raw, path.to_path_buf())?;
        ticket.check_consistency(expected)?;
        Ok(ticket)
    }

    /// Parse every ticket matching `filter`, skipping (and logging) files
    /// that fail to parse, sorted by `(priority, created_at)` ascending.
    pub fn enumerate(&self, filter: TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let mut tickets = Vec::new();
        for status in [Status::Todo, Status::Doing, Status::Done] {
            if !filter.includes(status) {
                continue;
            }
            let dir = self.dir_for(status);
            if !dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match self.load(id, &path, status) {
                    Ok(ticket) => tickets.push(ticket),
                    Err(e) => log::warn!("skipping unparseable ticket {}: {e}", path.display()),
                }
            }
        }

        tickets.sort_by(|a, b| {
            a.front_matter
                .priority
                .cmp(&b.front_matter.priority)
                .then(a.front_matter.created_at.cmp(&b.front_matter.created_at))
        });
        Ok(tickets)
    }

    /// Generate an id from the current local time and create a new `todo`
    /// ticket. Retries with a re-clocked id on a same-second collision.
    pub fn create(
        &self,
        slug: &str,
        description: &str,
        priority: i32,
        related: Vec<String>,
    ) -> Result<Ticket, TicketError> {
        if !is_valid_slug(slug) {
            return Err(TicketError::InvalidSlug {
                slug: slug.to_string(),
            });
        }
        self.ensure_dirs()?;

        loop {
            let now = Utc::now();
            let id = format!("{}-{slug}", now.format("%y%m%d-%H%M%S"));
            let path = self.dir_for(Status::Todo).join(format!("{id}.md"));
            if path.exists() {
                // Same-second collision: wait out the clock and retry.
                std::thread::sleep(std::time::Duration::from_millis(50));
                continue;
            }

            let ticket = Ticket {
                id: id.clone(),
                front_matter: FrontMatter {
                    priority,
                    description: description.to_string(),
                    created_at: now,
                    started_at: None,
                    closed_at: None,
                    closure_reason: None,
                    related,
                    extra: Default::default(),
                },
                content: self.config.template.clone(),
                path: path.clone(),
            };
            self.write_atomic(&path, &ticket.serialize()?)?;
            return Ok(ticket);
        }
    }

    /// Overwrite a ticket's file in place at its current `path`.
    pub fn update(&self, ticket: &Ticket) -> Result<(), TicketError> {
        self.write_atomic(&ticket.path, &ticket.serialize()?)
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), TicketError> {
        let dir = path.parent().ok_or_else(|| TicketError::Io(
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "ticket path has no parent"),
        ))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        use std::io::Write;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(path).map_err(|e| TicketError::Io(e.error))?;
        Ok(())
    }
}
