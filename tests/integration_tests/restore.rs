use rstest::rstest;

use crate::common::{assert_success, repo, stdout, TestRepo};

fn new_ticket(repo: &TestRepo, slug: &str) -> String {
    let output = repo.tf(&["new", slug, "--json"]);
    assert_success(&output, &format!("new {slug}"));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    json["id"].as_str().unwrap().to_string()
}

#[rstest]
fn restore_with_no_doing_tickets_clears_the_link(repo: TestRepo) {
    let restore = repo.tf(&["restore", "--json"]);
    assert_success(&restore, "restore");
    let json: serde_json::Value = serde_json::from_str(&stdout(&restore)).unwrap();
    assert!(json["current"].is_null());
    assert!(!repo.root_path().join("current-ticket.md").exists());
}

#[rstest]
fn restore_relinks_the_sole_doing_ticket(repo: TestRepo) {
    let id = new_ticket(&repo, "only-one");
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add ticket"]);
    assert_success(&repo.tf(&["start", &id]), "start");

    std::fs::remove_file(repo.root_path().join("current-ticket.md")).unwrap();

    let restore = repo.tf(&["restore", "--json"]);
    assert_success(&restore, "restore");
    let json: serde_json::Value = serde_json::from_str(&stdout(&restore)).unwrap();
    assert_eq!(json["current"].as_str(), Some(id.as_str()));
    assert!(repo.root_path().join("current-ticket.md").exists());

    // Idempotent: running it again with the link already correct changes
    // nothing observable.
    let second = repo.tf(&["restore", "--json"]);
    assert_success(&second, "restore (second run)");
    let second_json: serde_json::Value = serde_json::from_str(&stdout(&second)).unwrap();
    assert_eq!(second_json["current"].as_str(), Some(id.as_str()));
}

#[rstest]
fn restore_with_two_doing_tickets_is_ambiguous(repo: TestRepo) {
    let a = new_ticket(&repo, "ticket-a");
    let b = new_ticket(&repo, "ticket-b");
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add tickets"]);

    assert_success(&repo.tf(&["start", &a]), "start a");
    assert_success(&repo.tf(&["start", &b]), "start b");

    let restore = repo.tf(&["restore", "--json"]);
    assert!(!restore.status.success());
    let err: serde_json::Value = serde_json::from_str(&crate::common::stderr(&restore)).unwrap();
    assert_eq!(err["error"]["code"], "INVALID_CONTEXT");
}
