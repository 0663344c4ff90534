//! [`ProcessGitClient`] — the real `git` binary, wrapped behind [`GitClient`].

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::{Divergence, GitClient, GitError, WorktreeEntry, parse::parse_worktree_list};

/// Runs `git` as a subprocess in a fixed working directory, bounded by a
/// configurable per-invocation timeout.
#[derive(Debug, Clone)]
pub struct ProcessGitClient {
    cwd: PathBuf,
    root: PathBuf,
    timeout: Duration,
}

impl ProcessGitClient {
    /// Bind to `cwd`, which must already be inside a git working tree.
    /// `timeout` bounds every subprocess invocation made through this client.
    ///
    /// Resolves and caches the *main* repository root (the parent of git's
    /// common directory) up front, so [`GitClient::root_path`] keeps working
    /// even when `cwd` is inside one of its linked worktrees — invocations
    /// nested inside a worktree must still place sibling worktrees next to
    /// the main repo, not inside the one they were run from.
    pub fn at(cwd: impl Into<PathBuf>, timeout: Duration) -> Result<Self, GitError> {
        let cwd = cwd.into();
        let probe = ProcessGitClient {
            cwd: cwd.clone(),
            root: cwd.clone(),
            timeout,
        };
        // Fail fast if this isn't actually a repository.
        probe.exec(&["rev-parse", "--git-dir"])?;
        let common_dir = PathBuf::from(probe.exec(&["rev-parse", "--git-common-dir"])?);
        let common_dir = if common_dir.is_absolute() {
            common_dir
        } else {
            cwd.join(common_dir)
        };
        let common_dir = common_dir.canonicalize().unwrap_or(common_dir);
        let root = common_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());
        Ok(ProcessGitClient { cwd, root, timeout })
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output, GitError> {
        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let start = Instant::now();
        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                log::warn!("git {} timed out after {:?}", args.join(" "), start.elapsed());
                return Err(GitError::TimedOut {
                    args: args.join(" "),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let Some(mut out) = child.stdout.take() {
            use std::io::Read;
            let _ = out.read_to_end(&mut stdout);
        }
        if let Some(mut err) = child.stderr.take() {
            use std::io::Read;
            let _ = err.read_to_end(&mut stderr);
        }

        log::debug!(
            "$ git {} [{}] ({:.1}ms, ok={})",
            args.join(" "),
            self.cwd.display(),
            start.elapsed().as_secs_f64() * 1000.0,
            status.success()
        );

        Ok(std::process::Output {
            status,
            stdout,
            stderr,
        })
    }

    fn require_success(&self, args: &[&str], output: std::process::Output) -> Result<String, GitError> {
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitClient for ProcessGitClient {
    fn exec(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.run(args)?;
        self.require_success(args, output)
    }

    fn root_path(&self) -> &Path {
        &self.root
    }

    fn current_branch(&self) -> Result<Option<String>, GitError> {
        let name = self.exec(&["symbolic-ref", "--short", "-q", "HEAD"]);
        match name {
            Ok(branch) if !branch.is_empty() => Ok(Some(branch)),
            _ => Ok(None),
        }
    }

    fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
        let output = self.run(&["status", "--porcelain"])?;
        let stdout = self.require_success(&["status", "--porcelain"], output)?;
        Ok(!stdout.is_empty())
    }

    fn add(&self, paths: &[&Path]) -> Result<(), GitError> {
        let mut args = vec!["add", "--"];
        let owned: Vec<String> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        for p in &owned {
            args.push(p);
        }
        self.exec(&args).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        self.exec(&["commit", "-m", message]).map(|_| ())
    }

    fn checkout(&self, reference: &str) -> Result<(), GitError> {
        self.exec(&["checkout", reference]).map(|_| ())
    }

    fn checkout_new_branch(&self, name: &str) -> Result<(), GitError> {
        if self.branch_exists(name)? {
            return Err(GitError::BranchAlreadyExists { branch: name.to_string() });
        }
        self.exec(&["checkout", "-b", name]).map(|_| ())
    }

    fn create_branch(&self, name: &str, start_point: &str) -> Result<(), GitError> {
        self.exec(&["branch", name, start_point]).map(|_| ())
    }

    fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        let refname = format!("refs/heads/{name}");
        let output = self.run(&["show-ref", "--verify", "--quiet", &refname])?;
        Ok(output.status.success())
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<(), GitError> {
        if !self.branch_exists(name)? {
            return Ok(());
        }
        let flag = if force { "-D" } else { "-d" };
        self.exec(&["branch", flag, name]).map(|_| ())
    }

    fn is_branch_merged(&self, branch: &str, base: &str) -> Result<bool, GitError> {
        let merged = self.exec(&["branch", "--merged", base, "--format=%(refname:short)"])?;
        Ok(merged.lines().any(|l| l.trim() == branch))
    }

    fn branch_diverged_from(&self, branch: &str, base: &str) -> Result<Divergence, GitError> {
        let range = format!("{base}...{branch}");
        let counts = self.exec(&["rev-list", "--left-right", "--count", &range])?;
        let mut parts = counts.split_whitespace();
        let behind = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let ahead = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        Ok(Divergence { ahead, behind })
    }

    fn has_worktree(&self, id: &str) -> Result<bool, GitError> {
        Ok(self.find_worktree_by_branch(id)?.is_some())
    }

    fn add_worktree(
        &self,
        path: &Path,
        branch: &str,
        create_branch: bool,
        start_point: Option<&str>,
    ) -> Result<(), GitError> {
        if path.exists() {
            return Err(GitError::WorktreeExists { path: path.to_path_buf() });
        }
        let path_str = path.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "add"];
        if create_branch {
            args.push("-b");
            args.push(branch);
            args.push(&path_str);
            if let Some(sp) = start_point {
                args.push(sp);
            }
        } else {
            args.push(&path_str);
            args.push(branch);
        }
        let output = self.run(&args)?;
        self.require_success(&args, output)
            .map(|_| ())
            .map_err(|e| GitError::WorktreeCreateFailed {
                branch: branch.to_string(),
                reason: e.to_string(),
            })
    }

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), GitError> {
        if !path.exists() {
            return Ok(());
        }
        let path_str = path.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_str);
        let output = self.run(&args)?;
        self.require_success(&args, output)
            .map(|_| ())
            .map_err(|e| GitError::WorktreeRemoveFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn prune_worktrees(&self) -> Result<(), GitError> {
        self.exec(&["worktree", "prune"]).map(|_| ())
    }

    fn list_worktrees(&self) -> Result<Vec<WorktreeEntry>, GitError> {
        let stdout = self.exec(&["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_list(&stdout))
    }

    fn find_worktree_by_branch(&self, branch: &str) -> Result<Option<WorktreeEntry>, GitError> {
        Ok(self
            .list_worktrees()?
            .into_iter()
            .find(|wt| wt.branch.as_deref() == Some(branch)))
    }
}
