use gitcopy_core::memory::{InMemoryRemote, Operation};
use gitcopy_core::{Copier, CopyError, CopyRequest};

fn remote_with(files: &[(&str, &[u8])]) -> (InMemoryRemote, String) {
    let remote = InMemoryRemote::new();
    let tip = remote.seed_branch("main", files);
    (remote, tip)
}

// === Single file a/b/f.txt copied to c/d ===
#[tokio::test]
async fn test_copies_single_file_to_destination() {
    let (remote, tip) = remote_with(&[("a/b/f.txt", b"hello".as_slice())]);

    let mut copier = Copier::new(&remote);
    let outcome = copier.run(&CopyRequest::new("a/b", "c/d")).await.unwrap();

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].path, "c/d/f.txt");
    assert_eq!(outcome.entries[0].mode, "100644");
    assert_eq!(outcome.entries[0].kind, "blob");
    assert_eq!(outcome.parent_sha, tip);

    assert_eq!(remote.branch_tip("main"), Some(outcome.commit_sha.clone()));
    assert_eq!(remote.file_at("main", "c/d/f.txt"), Some(b"hello".to_vec()));
    // The source stays where it was.
    assert_eq!(remote.file_at("main", "a/b/f.txt"), Some(b"hello".to_vec()));

    let commit = remote.commit(&outcome.commit_sha).unwrap();
    assert_eq!(commit.message, "moved items from a/b to c/d");
}

// === Inline listings: paths rewritten, bytes preserved ===
#[tokio::test]
async fn test_inline_tree_preserves_paths_and_bytes() {
    let binary = [0u8, 159, 146, 150, 255];
    let (remote, _) = remote_with(&[
        ("src/dir/a.txt", b"alpha\n".as_slice()),
        ("src/dir/nested/b.bin", binary.as_slice()),
        ("src/dir/nested/c.md", "héllo wörld".as_bytes()),
        ("src/other.txt", b"outside".as_slice()),
    ]);
    remote.set_inline_listings(true);

    let mut copier = Copier::new(&remote);
    let outcome = copier.run(&CopyRequest::new("src/dir", "dst")).await.unwrap();

    let paths: Vec<&str> = outcome.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["dst/a.txt", "dst/nested/b.bin", "dst/nested/c.md"]);
    assert_eq!(remote.file_at("main", "dst/a.txt"), Some(b"alpha\n".to_vec()));
    assert_eq!(remote.file_at("main", "dst/nested/b.bin"), Some(binary.to_vec()));
    assert_eq!(
        remote.file_at("main", "dst/nested/c.md"),
        Some("héllo wörld".as_bytes().to_vec())
    );
    assert_eq!(remote.file_at("main", "dst/other.txt"), None);
    // Only the nested directory listing costs a request; inline files do not.
    assert_eq!(remote.count_calls(Operation::GetContentsByUrl), 1);
    assert_eq!(remote.count_calls(Operation::GetBlob), 0);
}

// === Commit has exactly one parent: the tip seen by the run ===
#[tokio::test]
async fn test_commit_has_single_parent() {
    let (remote, tip) = remote_with(&[("a/f.txt", b"x".as_slice())]);

    let mut copier = Copier::new(&remote);
    let outcome = copier.run(&CopyRequest::new("a", "b")).await.unwrap();

    let commit = remote.commit(&outcome.commit_sha).unwrap();
    let parents: Vec<&str> = commit.parents.iter().map(|p| p.sha.as_str()).collect();
    assert_eq!(parents, vec![tip.as_str()]);
    assert_eq!(remote.count_calls(Operation::ListRefs), 1);
}

// === Running the same copy twice ===
#[tokio::test]
async fn test_repeated_copy_creates_independent_commits() {
    let (remote, tip) = remote_with(&[("a/b/f.txt", b"hello".as_slice())]);
    let request = CopyRequest::new("a/b", "c/d");

    let first = Copier::new(&remote).run(&request).await.unwrap();
    let second = Copier::new(&remote).run(&request).await.unwrap();

    assert_ne!(first.commit_sha, second.commit_sha);
    assert_eq!(first.parent_sha, tip);
    assert_eq!(second.parent_sha, first.commit_sha);
    assert_eq!(remote.branch_tip("main"), Some(second.commit_sha.clone()));
    assert_eq!(remote.file_at("main", "c/d/f.txt"), Some(b"hello".to_vec()));
}

// === Existing destination files are overwritten, others kept ===
#[tokio::test]
async fn test_copy_over_existing_destination() {
    let (remote, _) = remote_with(&[
        ("a/f.txt", b"new".as_slice()),
        ("b/f.txt", b"old".as_slice()),
        ("b/keep.txt", b"keep".as_slice()),
    ]);

    Copier::new(&remote)
        .run(&CopyRequest::new("a", "b"))
        .await
        .unwrap();

    assert_eq!(remote.file_at("main", "b/f.txt"), Some(b"new".to_vec()));
    assert_eq!(remote.file_at("main", "b/keep.txt"), Some(b"keep".to_vec()));
}

// === Missing default branch ===
#[tokio::test]
async fn test_missing_branch_fails_before_tree() {
    let remote = InMemoryRemote::new();
    remote.set_default_branch("master");
    remote.seed_branch("master", &[("a/f.txt", b"x".as_slice())]);

    let mut copier = Copier::new(&remote);
    let err = copier.run(&CopyRequest::new("a", "b")).await.unwrap_err();

    assert!(matches!(err, CopyError::BranchNotFound(ref b) if b == "main"));
    assert_eq!(remote.count_calls(Operation::CreateTree), 0);
    assert_eq!(remote.count_calls(Operation::CreateCommit), 0);
    assert_eq!(remote.count_calls(Operation::UpdateRef), 0);

    // Blobs uploaded before the lookup stay behind.
    assert_eq!(copier.created().blobs.len(), 1);
    assert!(remote.has_blob(&copier.created().blobs[0]));
}

// === A failing stage stops the pipeline ===
#[tokio::test]
async fn test_failure_at_any_stage_aborts() {
    let stages = [
        Operation::GetContents,
        Operation::GetContentsByUrl,
        Operation::CreateBlob,
        Operation::ListRefs,
        Operation::GetCommit,
        Operation::CreateTree,
        Operation::CreateCommit,
        Operation::UpdateRef,
    ];

    for failing in stages {
        let (remote, tip) = remote_with(&[
            ("a/f.txt", b"1".as_slice()),
            ("a/g.txt", b"2".as_slice()),
        ]);
        remote.fail_on(failing, 500);

        let err = Copier::new(&remote)
            .run(&CopyRequest::new("a", "b"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500), "stage {failing:?}");
        let calls = remote.calls();
        assert_eq!(calls.last(), Some(&failing), "stage {failing:?}");
        assert_eq!(remote.count_calls(failing), 1, "stage {failing:?}");
        assert_eq!(remote.branch_tip("main"), Some(tip), "stage {failing:?}");
    }
}

// === Nothing is rolled back after a late failure ===
#[tokio::test]
async fn test_orphans_remain_after_tree_failure() {
    let (remote, tip) = remote_with(&[("a/f.txt", b"orphan me".as_slice())]);
    let blobs_before = remote.blob_count();
    remote.fail_on(Operation::CreateTree, 422);

    let mut copier = Copier::new(&remote);
    let err = copier.run(&CopyRequest::new("a", "z")).await.unwrap_err();

    assert_eq!(err.status(), Some(422));
    let created = copier.created();
    assert_eq!(created.blobs.len(), 1);
    assert_eq!(created.tree, None);
    assert_eq!(created.commit, None);
    // Same content as the seeded blob, so the store does not grow.
    assert_eq!(remote.blob_count(), blobs_before);
    assert!(remote.has_blob(&created.blobs[0]));
    assert_eq!(remote.branch_tip("main"), Some(tip));
}

// === Non-forced update succeeds as a fast-forward ===
#[tokio::test]
async fn test_no_force_run_is_fast_forward() {
    let (remote, tip) = remote_with(&[("a/f.txt", b"x".as_slice())]);

    let outcome = Copier::new(&remote)
        .force(false)
        .run(&CopyRequest::new("a", "b"))
        .await
        .unwrap();

    assert_eq!(outcome.parent_sha, tip);
    assert_eq!(remote.branch_tip("main"), Some(outcome.commit_sha));
    assert_eq!(remote.commit_count(), 2);
}

// === Non-forced update refuses to rewind a moved branch ===
#[tokio::test]
async fn test_no_force_rejects_branch_moved_after_resolve() {
    let (remote, tip) = remote_with(&[("a/f.txt", b"x".as_slice())]);
    let request = CopyRequest::new("a", "b");
    let tree = remote.commit(&tip).unwrap().tree.sha;

    // Someone else moves main after the tip was read.
    let moved = remote.seed_branch("main", &[("other.txt", b"y".as_slice())]);

    let mut copier = Copier::new(&remote).force(false);
    let err = copier
        .commit_and_advance(&request, &tree, &tip)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(remote.branch_tip("main"), Some(moved));
    let orphan = copier.created().commit.clone().unwrap();
    let parents: Vec<String> = remote
        .commit(&orphan)
        .unwrap()
        .parents
        .into_iter()
        .map(|p| p.sha)
        .collect();
    assert_eq!(parents, vec![tip]);
}

// === Forced update overwrites a moved branch ===
#[tokio::test]
async fn test_force_overwrites_branch_moved_after_resolve() {
    let (remote, tip) = remote_with(&[("a/f.txt", b"x".as_slice())]);
    let tree = remote.commit(&tip).unwrap().tree.sha;
    remote.seed_branch("main", &[("other.txt", b"y".as_slice())]);

    let mut copier = Copier::new(&remote);
    let commit = copier
        .commit_and_advance(&CopyRequest::new("a", "b"), &tree, &tip)
        .await
        .unwrap();

    assert_eq!(remote.branch_tip("main"), Some(commit));
}
