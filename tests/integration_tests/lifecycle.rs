use rstest::rstest;

use crate::common::{assert_success, repo, stdout, TestRepo};

fn new_ticket(repo: &TestRepo, slug: &str) -> String {
    let output = repo.tf(&["new", slug, "--json"]);
    assert_success(&output, &format!("new {slug}"));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    json["id"].as_str().unwrap().to_string()
}

/// init -> new -> commit -> start -> work -> close, the full happy path.
#[rstest]
fn happy_path_start_commit_close(repo: TestRepo) {
    let id = new_ticket(&repo, "implement-auth");
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add ticket"]);

    let start = repo.tf(&["start", &id, "--json"]);
    assert_success(&start, "start");
    let start_json: serde_json::Value = serde_json::from_str(&stdout(&start)).unwrap();
    let worktree_path = std::path::PathBuf::from(start_json["worktreePath"].as_str().unwrap());
    assert!(worktree_path.is_dir());

    std::fs::write(worktree_path.join("change.txt"), "x").unwrap();
    repo.commit_all_in(&worktree_path, "do the work");

    let close = repo.tf(&["close", "--json"]);
    assert_success(&close, "close");

    assert!(repo.root_path().join(format!("tickets/done/{id}.md")).exists());
    assert!(!repo.root_path().join(format!("tickets/doing/{id}.md")).exists());
    assert!(!repo.root_path().join("current-ticket.md").exists());

    let branches = repo.git_output(&["branch", "--format=%(refname:short)"]);
    assert!(branches.lines().any(|b| b == id), "branch should survive close");
    assert!(worktree_path.is_dir(), "worktree should survive close");
}

/// Closing without a reason on an unmerged branch fails; retrying with
/// --reason succeeds.
#[rstest]
fn close_without_reason_requires_merged_branch(repo: TestRepo) {
    let id = new_ticket(&repo, "risky-change");
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add ticket"]);

    let start = repo.tf(&["start", &id, "--json"]);
    assert_success(&start, "start");
    let start_json: serde_json::Value = serde_json::from_str(&stdout(&start)).unwrap();
    let worktree_path = std::path::PathBuf::from(start_json["worktreePath"].as_str().unwrap());
    std::fs::write(worktree_path.join("risky.txt"), "x").unwrap();
    repo.commit_all_in(&worktree_path, "unmerged work");

    // Move off the branch and drop the symlink before closing by id.
    repo.run_git(&["checkout", "-q", "main"]);
    std::fs::remove_file(repo.root_path().join("current-ticket.md")).ok();

    let fail = repo.tf(&["close", &id, "--json"]);
    assert!(!fail.status.success());
    let err: serde_json::Value = serde_json::from_str(&crate::common::stderr(&fail)).unwrap();
    assert_eq!(err["error"]["code"], "GIT_MERGE_FAILED");

    let ok = repo.tf(&["close", &id, "--reason", "Abandoned", "--json"]);
    assert_success(&ok, "close --reason Abandoned");

    let show = repo.tf(&["show", &id, "--json"]);
    assert_success(&show, "show");
    let ticket: serde_json::Value = serde_json::from_str(&stdout(&show)).unwrap();
    assert_eq!(ticket["closure_reason"].as_str(), Some("Abandoned"));

    let message = repo.git_output(&["log", "-1", "--pretty=%B"]);
    assert!(message.contains("\n\nReason: Abandoned"));
}

/// Closing ticket B by id must not disturb the symlink pointing at ticket A.
#[rstest]
#[cfg(unix)]
fn closing_foreign_ticket_preserves_current_link(repo: TestRepo) {
    let a = new_ticket(&repo, "ticket-a");
    let b = new_ticket(&repo, "ticket-b");
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add tickets"]);

    assert_success(&repo.tf(&["start", &a]), "start a");
    let start_b = repo.tf(&["start", &b, "--json"]);
    assert_success(&start_b, "start b");

    // starting b moved the link to b; restore it to simulate the scenario
    // where a is current and b is closed out from under it.
    let target = format!("tickets/doing/{a}.md");
    std::fs::remove_file(repo.root_path().join("current-ticket.md")).ok();
    #[cfg(unix)]
    std::os::unix::fs::symlink(&target, repo.root_path().join("current-ticket.md")).unwrap();

    let start_b_json: serde_json::Value = serde_json::from_str(&stdout(&start_b)).unwrap();
    let wt_b = std::path::PathBuf::from(start_b_json["worktreePath"].as_str().unwrap());
    repo.commit_all_in(&wt_b, "b work");
    // main root stays on "main" throughout (worktree mode never checks it
    // out); fast-forward main to pick up b's commit so the merge guard in
    // Close passes without needing --reason.
    repo.run_git(&["merge", "-q", "--ff-only", &b]);

    let close_b = repo.tf(&["close", &b, "--json"]);
    assert_success(&close_b, "close b");

    let status = repo.tf(&["status", "--json"]);
    assert_success(&status, "status");
    let status_json: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(status_json["current"]["id"].as_str(), Some(a.as_str()));
}

#[rstest]
fn start_on_missing_doing_dir_auto_creates_it(repo: TestRepo) {
    let id = new_ticket(&repo, "first-ticket");
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add ticket"]);
    std::fs::remove_dir(repo.root_path().join("tickets/doing")).unwrap();

    let start = repo.tf(&["start", &id]);
    assert_success(&start, "start");
    assert!(repo.root_path().join("tickets/doing").is_dir());
}
