//! Worktree path resolution, creation/destruction, and init-command
//! execution.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::config::WorktreeConfig;
use crate::git::{GitClient, WorktreeEntry};

use super::WorkspaceError;

pub struct WorktreeCoordinator {
    /// Root of the **main** repository — worktree paths are always resolved
    /// relative to this, never to the current working directory, so
    /// invocations from inside another worktree still produce flat
    /// siblings instead of nested worktrees.
    main_root: PathBuf,
    base_dir: PathBuf,
    init_commands: Vec<String>,
    init_timeout: Duration,
}

impl WorktreeCoordinator {
    pub fn new(main_root: impl Into<PathBuf>, config: &WorktreeConfig, init_timeout: Duration) -> Self {
        let main_root = main_root.into();
        let base_dir = {
            let configured = PathBuf::from(&config.base_dir);
            if configured.is_absolute() {
                configured
            } else {
                main_root.join(configured)
            }
        };
        WorktreeCoordinator {
            main_root,
            base_dir,
            init_commands: config.init_commands.clone(),
            init_timeout,
        }
    }

    /// The flat sibling path `<base_dir>/<id>`, always under the main repo
    /// root regardless of where the process was invoked from.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.base_dir.join(id)
    }

    pub fn main_root(&self) -> &Path {
        &self.main_root
    }

    /// Create the worktree and run init commands. Init-command failures are
    /// collected and returned as `Ok((path, Some(failed_commands)))` — the
    /// worktree itself is kept regardless.
    pub fn create(
        &self,
        git: &dyn GitClient,
        id: &str,
        create_branch: bool,
        start_point: Option<&str>,
    ) -> Result<(PathBuf, Option<Vec<String>>), WorkspaceError> {
        let path = self.path_for(id);
        std::fs::create_dir_all(&self.base_dir)?;
        git.add_worktree(&path, id, create_branch, start_point)?;

        let failed = self.run_init_commands(&path);
        if failed.is_empty() {
            Ok((path, None))
        } else {
            Ok((path, Some(failed)))
        }
    }

    pub fn destroy(&self, git: &dyn GitClient, path: &Path, force: bool) -> Result<(), WorkspaceError> {
        git.remove_worktree(path, force)?;
        Ok(())
    }

    pub fn prune(&self, git: &dyn GitClient) -> Result<(), WorkspaceError> {
        git.prune_worktrees()?;
        Ok(())
    }

    pub fn list(&self, git: &dyn GitClient) -> Result<Vec<WorktreeEntry>, WorkspaceError> {
        Ok(git.list_worktrees()?)
    }

    /// Run each configured init command in `cwd`, bounded by
    /// `timeouts.init_commands`. Returns the command strings that failed or
    /// timed out; never returns `Err` — these failures are warnings.
    fn run_init_commands(&self, cwd: &Path) -> Vec<String> {
        let mut failed = Vec::new();
        for command_line in &self.init_commands {
            match self.run_one(command_line, cwd) {
                Ok(true) => {}
                Ok(false) | Err(_) => failed.push(command_line.clone()),
            }
        }
        failed
    }

    fn run_one(&self, command_line: &str, cwd: &Path) -> std::io::Result<bool> {
        let parts = shell_words::split(command_line)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let Some((program, args)) = parts.split_first() else {
            return Ok(true);
        };

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        match child.wait_timeout(self.init_timeout)? {
            Some(status) => Ok(status.success()),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                log::warn!("init command '{command_line}' timed out after {:?}", self.init_timeout);
                Ok(false)
            }
        }
    }
}
