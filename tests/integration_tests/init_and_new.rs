use rstest::rstest;

use crate::common::{assert_success, repo, stdout, TestRepo};

#[test]
fn init_writes_config_dirs_and_gitignore() {
    let repo = TestRepo::new();
    let output = repo.tf(&["init"]);
    assert_success(&output, "init");

    assert!(repo.root_path().join(".ticketflow.yaml").exists());
    assert!(repo.root_path().join("tickets/todo").is_dir());
    assert!(repo.root_path().join("tickets/doing").is_dir());
    assert!(repo.root_path().join("tickets/done").is_dir());

    let ignore = std::fs::read_to_string(repo.root_path().join(".gitignore")).unwrap();
    assert!(ignore.lines().any(|l| l == "current-ticket.md"));
}

#[test]
fn init_is_idempotent_and_preserves_edited_config() {
    let repo = TestRepo::new();
    assert_success(&repo.tf(&["init"]), "init");
    repo.write_config("git:\n  default_branch: trunk\n");

    assert_success(&repo.tf(&["init"]), "init (second run)");
    let config = std::fs::read_to_string(repo.root_path().join(".ticketflow.yaml")).unwrap();
    assert!(config.contains("trunk"));
}

#[rstest]
fn new_creates_todo_ticket_with_generated_id(repo: TestRepo) {
    let output = repo.tf(&["new", "implement-auth", "--description", "Implement auth"]);
    assert_success(&output, "new implement-auth");
    let out = stdout(&output);
    assert!(out.starts_with("Created "));

    let todo_dir = repo.root_path().join("tickets/todo");
    let entries: Vec<_> = std::fs::read_dir(&todo_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let path = entries[0].as_ref().unwrap().path();
    assert!(path.file_name().unwrap().to_str().unwrap().ends_with("-implement-auth.md"));
}

#[rstest]
fn new_rejects_invalid_slug(repo: TestRepo) {
    let output = repo.tf(&["new", "Not A Slug"]);
    assert!(!output.status.success());
}

#[rstest]
fn new_with_parent_records_related_entry(repo: TestRepo) {
    let parent = repo.tf(&["new", "parent-ticket", "--json"]);
    assert_success(&parent, "new parent-ticket");
    let parent_json: serde_json::Value = serde_json::from_str(&stdout(&parent)).unwrap();
    let parent_id = parent_json["id"].as_str().unwrap().to_string();

    let child = repo.tf(&["new", "child-ticket", "--parent", &parent_id, "--json"]);
    assert_success(&child, "new child-ticket --parent");
    let child_json: serde_json::Value = serde_json::from_str(&stdout(&child)).unwrap();
    let related = child_json["related"].as_array().unwrap();
    assert_eq!(related[0].as_str().unwrap(), format!("parent:{parent_id}"));
}
