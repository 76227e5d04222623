//! Integration tests for branch creation, checkout, merge, and deletion.

mod common;

use common::TestRepo;

use gitward::core::model::BranchKind;
use gitward::git::MergeOutcome;
use gitward::service::ServiceError;

fn local_names(repo: &TestRepo) -> Vec<String> {
    repo.svc
        .branches()
        .unwrap()
        .into_iter()
        .filter(|b| b.kind == BranchKind::Local)
        .map(|b| b.name)
        .collect()
}

#[test]
fn create_and_checkout_leaves_exactly_one_current_branch() {
    let repo = TestRepo::new();
    let head = repo.commit_file("a.txt", "x\n", "first");

    let target = repo.svc.create_branch("feature", None).unwrap();
    assert_eq!(target, head);
    repo.svc.checkout_branch("feature").unwrap();

    assert_eq!(repo.svc.current_branch().as_deref(), Some("feature"));
    let branches = repo.svc.branches().unwrap();
    let current: Vec<_> = branches.iter().filter(|b| b.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].name, "feature");
}

#[test]
fn create_from_start_point() {
    let repo = TestRepo::new();
    let first = repo.commit_file("a.txt", "one\n", "first");
    repo.commit_file("a.txt", "two\n", "second");

    let target = repo.svc.create_branch("old", Some(first.as_str())).unwrap();
    assert_eq!(target, first);
}

#[test]
fn create_existing_branch_fails() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.create_branch("feature", None).unwrap();

    assert!(matches!(
        repo.svc.create_branch("feature", None),
        Err(ServiceError::BranchExists { .. })
    ));
}

#[test]
fn invalid_branch_name_is_rejected() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");

    assert!(matches!(
        repo.svc.create_branch("has space", None),
        Err(ServiceError::InvalidName(_))
    ));
}

#[test]
fn checkout_missing_branch_fails() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");

    assert!(matches!(
        repo.svc.checkout_branch("nope"),
        Err(ServiceError::BranchNotFound { .. })
    ));
}

#[test]
fn checkout_over_local_changes_is_a_conflict() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    let main = repo.branch();

    repo.svc.create_branch("feature", None).unwrap();
    repo.svc.checkout_branch("feature").unwrap();
    repo.commit_file("a.txt", "two\n", "second");
    repo.svc.checkout_branch(&main).unwrap();

    repo.write("a.txt", "local edit\n");
    assert!(matches!(
        repo.svc.checkout_branch("feature"),
        Err(ServiceError::CheckoutConflict { .. })
    ));

    assert_eq!(repo.branch(), main);
    let content = std::fs::read_to_string(repo.root().join("a.txt")).unwrap();
    assert_eq!(content, "local edit\n");
}

#[test]
fn deleting_current_branch_fails_and_changes_nothing() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.create_branch("feature", None).unwrap();
    let before = local_names(&repo);

    let current = repo.branch();
    assert!(matches!(
        repo.svc.delete_branch(&current),
        Err(ServiceError::BranchInUse { .. })
    ));
    assert_eq!(local_names(&repo), before);
}

#[test]
fn delete_other_branch() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.create_branch("feature", None).unwrap();

    repo.svc.delete_branch("feature").unwrap();
    assert!(!local_names(&repo).contains(&"feature".to_string()));
}

#[test]
fn merge_fast_forwards() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    let main = repo.branch();

    repo.svc.create_branch("feature", None).unwrap();
    repo.svc.checkout_branch("feature").unwrap();
    let tip = repo.commit_file("b.txt", "b\n", "feature work");

    repo.svc.checkout_branch(&main).unwrap();
    let outcome = repo.svc.merge_branch("feature").unwrap();

    assert_eq!(outcome, MergeOutcome::FastForward(tip.clone()));
    assert_eq!(repo.svc.history(1).unwrap()[0].id, tip);
    assert!(repo.root().join("b.txt").exists());
}

#[test]
fn merge_of_ancestor_is_up_to_date() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    repo.svc.create_branch("behind", None).unwrap();
    repo.commit_file("a.txt", "two\n", "second");

    assert_eq!(repo.svc.merge_branch("behind").unwrap(), MergeOutcome::UpToDate);
}

#[test]
fn diverged_branches_produce_merge_commit() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "base\n", "base");
    let main = repo.branch();

    repo.svc.create_branch("feature", None).unwrap();
    repo.svc.checkout_branch("feature").unwrap();
    repo.commit_file("b.txt", "feature\n", "feature side");

    repo.svc.checkout_branch(&main).unwrap();
    repo.commit_file("c.txt", "main\n", "main side");

    let outcome = repo.svc.merge_branch("feature").unwrap();
    let MergeOutcome::Merged(oid) = outcome else {
        panic!("expected merge commit, got {outcome:?}");
    };

    let head = &repo.svc.history(1).unwrap()[0];
    assert_eq!(head.id, oid);
    assert_eq!(head.parent_count, 2);
    assert!(head.is_merge());
    assert!(head.summary.contains("feature"));
}

#[test]
fn conflicting_merge_creates_no_commit() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "base\n", "base");
    let main = repo.branch();

    repo.svc.create_branch("feature", None).unwrap();
    repo.svc.checkout_branch("feature").unwrap();
    repo.commit_file("a.txt", "feature\n", "feature edit");

    repo.svc.checkout_branch(&main).unwrap();
    let head = repo.commit_file("a.txt", "main\n", "main edit");

    match repo.svc.merge_branch("feature") {
        Err(ServiceError::MergeConflict { paths }) => assert_eq!(paths, vec!["a.txt".to_string()]),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(repo.svc.history(1).unwrap()[0].id, head);
    assert_eq!(
        std::fs::read_to_string(repo.root().join("a.txt")).unwrap(),
        "main\n"
    );
}

#[test]
fn merge_missing_branch_fails() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");

    assert!(matches!(
        repo.svc.merge_branch("ghost"),
        Err(ServiceError::BranchNotFound { .. })
    ));
}
