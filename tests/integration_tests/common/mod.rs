//! Test harness for the `tf` CLI: an isolated git repository with a
//! deterministic author/committer identity, plus a `tf_command()` helper
//! that runs the built binary with an environment clean of host git
//! configuration. Covers what TicketFlow's end-to-end tests need (no
//! remotes, no shell integration, no PTY).

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Null device path, platform-appropriate.
#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

/// Deterministic commit timestamp so tests never depend on wall-clock time.
const GIT_DATE: &str = "2026-01-01T00:00:00Z";

pub struct TestRepo {
    temp_dir: TempDir,
    root: PathBuf,
    git_config_path: PathBuf,
}

impl TestRepo {
    /// A fresh repository on `main` with a single commit, `.ticketflow.yaml`
    /// written, and the ticket directories created (equivalent to `tf init`
    /// without shelling out to the binary for setup speed).
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("repo");
        std::fs::create_dir(&root).unwrap();
        let git_config_path = temp_dir.path().join("test-gitconfig");
        std::fs::write(
            &git_config_path,
            "[user]\n\tname = Test\n\temail = test@example.com\n\
             [advice]\n\tdetachedHead = false\n",
        )
        .unwrap();

        let repo = TestRepo { temp_dir, root, git_config_path };
        repo.run_git(&["init", "-q", "-b", "main"]);
        std::fs::write(repo.root.join("README.md"), "hello\n").unwrap();
        repo.run_git(&["add", "."]);
        repo.run_git(&["commit", "-q", "-m", "initial"]);
        repo
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    fn configure_git_cmd(&self, cmd: &mut Command) {
        cmd.env("GIT_CONFIG_GLOBAL", &self.git_config_path);
        cmd.env("GIT_CONFIG_SYSTEM", NULL_DEVICE);
        cmd.env("GIT_AUTHOR_DATE", GIT_DATE);
        cmd.env("GIT_COMMITTER_DATE", GIT_DATE);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.env("LC_ALL", "C");
        cmd.env("LANG", "C");
    }

    pub fn git_command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root);
        self.configure_git_cmd(&mut cmd);
        cmd
    }

    pub fn run_git(&self, args: &[&str]) {
        let output = self.git_command().args(args).output().unwrap();
        check_status(&output, &args.join(" "));
    }

    pub fn run_git_in(&self, dir: &Path, args: &[&str]) {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir);
        self.configure_git_cmd(&mut cmd);
        let output = cmd.args(args).output().unwrap();
        check_status(&output, &args.join(" "));
    }

    pub fn git_output(&self, args: &[&str]) -> String {
        let output = self.git_command().args(args).output().unwrap();
        check_status(&output, &args.join(" "));
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn commit_all_in(&self, dir: &Path, message: &str) {
        self.run_git_in(dir, &["add", "."]);
        self.run_git_in(dir, &["commit", "-q", "-m", message]);
    }

    /// A `tf` invocation rooted at the repo, with `-C` pointed at `dir` so
    /// callers can exercise nested-worktree invocations.
    pub fn tf_command_in(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tf"));
        cmd.arg("-C").arg(dir);
        self.configure_git_cmd(&mut cmd);
        cmd.env_remove("TICKETFLOW_CONFIG_PATH");
        cmd
    }

    pub fn tf_command(&self) -> Command {
        self.tf_command_in(&self.root)
    }

    pub fn tf(&self, args: &[&str]) -> std::process::Output {
        self.tf_command().args(args).output().unwrap()
    }

    pub fn tf_in(&self, dir: &Path, args: &[&str]) -> std::process::Output {
        self.tf_command_in(dir).args(args).output().unwrap()
    }

    pub fn write_config(&self, yaml: &str) {
        std::fs::write(self.root.join(".ticketflow.yaml"), yaml).unwrap();
    }

    pub fn home_path(&self) -> &Path {
        self.temp_dir.path()
    }
}

pub fn check_status(output: &std::process::Output, cmd_desc: &str) {
    if !output.status.success() {
        panic!(
            "git {} failed:\nstdout: {}\nstderr: {}",
            cmd_desc,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Assert a `tf` invocation succeeded, panicking with its stderr otherwise.
pub fn assert_success(output: &std::process::Output, what: &str) {
    if !output.status.success() {
        panic!(
            "tf {} failed:\nstdout: {}\nstderr: {}",
            what,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

pub fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[rstest::fixture]
pub fn repo() -> TestRepo {
    let repo = TestRepo::new();
    let output = repo.tf(&["init"]);
    assert_success(&output, "init");
    repo
}
