use rstest::rstest;

use crate::common::{assert_success, repo, stdout, TestRepo};

/// Starting a second ticket from inside the first ticket's worktree must
/// not nest the second worktree under the first — both land as flat
/// siblings under the main repo's `.worktrees/`.
#[rstest]
fn nested_invocation_still_produces_a_flat_sibling_worktree(repo: TestRepo) {
    let parent = repo.tf(&["new", "parent-task", "--json"]);
    assert_success(&parent, "new parent-task");
    let parent_id: String = {
        let json: serde_json::Value = serde_json::from_str(&stdout(&parent)).unwrap();
        json["id"].as_str().unwrap().to_string()
    };
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add parent ticket"]);

    let start_parent = repo.tf(&["start", &parent_id, "--json"]);
    assert_success(&start_parent, "start parent");
    let parent_json: serde_json::Value = serde_json::from_str(&stdout(&start_parent)).unwrap();
    let parent_worktree = std::path::PathBuf::from(parent_json["worktreePath"].as_str().unwrap());
    assert!(parent_worktree.is_dir());

    // Run every subsequent command with `-C <parent worktree>`, as a user
    // would after `cd`-ing into it.
    let new_child = repo.tf_in(&parent_worktree, &["new", "child-task", "--json"]);
    assert_success(&new_child, "new child-task (from within parent worktree)");
    let child_id: String = {
        let json: serde_json::Value = serde_json::from_str(&stdout(&new_child)).unwrap();
        json["id"].as_str().unwrap().to_string()
    };
    repo.commit_all_in(&parent_worktree, "add child ticket from parent worktree");

    let start_child = repo.tf_in(&parent_worktree, &["start", &child_id, "--json"]);
    assert_success(&start_child, "start child-task (from within parent worktree)");
    let child_json: serde_json::Value = serde_json::from_str(&stdout(&start_child)).unwrap();
    let child_worktree = std::path::PathBuf::from(child_json["worktreePath"].as_str().unwrap());

    let expected = repo.root_path().join(".worktrees").join(&child_id);
    assert_eq!(
        dunce::simplified(&child_worktree),
        dunce::simplified(&expected),
        "child worktree must be a sibling of the parent, not nested under it"
    );
    assert!(
        !child_worktree.starts_with(&parent_worktree),
        "child worktree must not be created inside the parent's worktree"
    );
}

#[rstest]
fn status_from_within_a_worktree_still_reports_the_global_current_ticket(repo: TestRepo) {
    let new = repo.tf(&["new", "only-task", "--json"]);
    assert_success(&new, "new only-task");
    let id: String = {
        let json: serde_json::Value = serde_json::from_str(&stdout(&new)).unwrap();
        json["id"].as_str().unwrap().to_string()
    };
    repo.run_git(&["add", "."]);
    repo.run_git(&["commit", "-q", "-m", "add ticket"]);

    let start = repo.tf(&["start", &id, "--json"]);
    assert_success(&start, "start");
    let start_json: serde_json::Value = serde_json::from_str(&stdout(&start)).unwrap();
    let worktree_path = std::path::PathBuf::from(start_json["worktreePath"].as_str().unwrap());

    let status = repo.tf_in(&worktree_path, &["status", "--json"]);
    assert_success(&status, "status (from within worktree)");
    let status_json: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(status_json["current"]["id"].as_str(), Some(id.as_str()));
}
