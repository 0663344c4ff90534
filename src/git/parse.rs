//! Parsing for `git worktree list --porcelain` output.

use std::path::PathBuf;

use super::WorktreeEntry;

/// Parse the porcelain worktree list format: records separated by a blank
/// line, each a sequence of `key value` (or bare `key`) lines starting with
/// `worktree <path>`. Bare (no-branch/bare-repo) entries are skipped.
pub fn parse_worktree_list(stdout: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();

    let mut path: Option<PathBuf> = None;
    let mut head: Option<String> = None;
    let mut branch: Option<String> = None;
    let mut bare = false;

    let flush = |path: &mut Option<PathBuf>,
                 head: &mut Option<String>,
                 branch: &mut Option<String>,
                 bare: &mut bool,
                 out: &mut Vec<WorktreeEntry>| {
        if let Some(p) = path.take() {
            if !*bare {
                out.push(WorktreeEntry {
                    path: p,
                    branch: branch.take(),
                    head: head.clone().unwrap_or_default(),
                });
            }
        }
        *head = None;
        *branch = None;
        *bare = false;
    };

    for line in stdout.lines() {
        if line.is_empty() {
            flush(&mut path, &mut head, &mut branch, &mut bare, &mut entries);
            continue;
        }
        if let Some(rest) = line.strip_prefix("worktree ") {
            flush(&mut path, &mut head, &mut branch, &mut bare, &mut entries);
            path = Some(PathBuf::from(rest));
        } else if let Some(rest) = line.strip_prefix("HEAD ") {
            head = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("branch ") {
            branch = Some(
                rest.strip_prefix("refs/heads/")
                    .unwrap_or(rest)
                    .to_string(),
            );
        } else if line == "bare" {
            bare = true;
        }
        // "detached", "locked", "prunable" and their reasons are not needed
        // by the coordinator today.
    }
    flush(&mut path, &mut head, &mut branch, &mut bare, &mut entries);

    entries
}
