use tracing::{debug, info};

use crate::api::{GitHubApi, DEFAULT_BRANCH};
use crate::branch::resolve_branch_tip;
use crate::path::{normalize_path, rewrite_path};
use crate::types::{NewBlob, NewTreeEntry};
use crate::walker::{walk_tree, WalkedFile};
use crate::CopyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: String,
    pub destination: String,
}

impl CopyRequest {
    pub fn new(source: &str, destination: &str) -> Self {
        Self {
            source: normalize_path(source).to_string(),
            destination: normalize_path(destination).to_string(),
        }
    }

    pub fn commit_message(&self) -> String {
        format!("moved items from {} to {}", self.source, self.destination)
    }
}

/// Remote objects created so far. Nothing is deleted when a run fails, so
/// after an error these are orphans on the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedObjects {
    pub blobs: Vec<String>,
    pub tree: Option<String>,
    pub commit: Option<String>,
}

impl CreatedObjects {
    pub fn len(&self) -> usize {
        self.blobs.len() + usize::from(self.tree.is_some()) + usize::from(self.commit.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub commit_sha: String,
    pub tree_sha: String,
    pub parent_sha: String,
    pub entries: Vec<NewTreeEntry>,
}

/// Runs one copy: walk the source, upload blobs, resolve the branch tip,
/// build a tree on top of the tip's tree, commit, and move the branch.
///
/// Stages run strictly in that order and the first error aborts the run.
pub struct Copier<'a> {
    api: &'a dyn GitHubApi,
    force: bool,
    created: CreatedObjects,
}

impl<'a> Copier<'a> {
    pub fn new(api: &'a dyn GitHubApi) -> Self {
        Self {
            api,
            force: true,
            created: CreatedObjects::default(),
        }
    }

    /// Whether the final ref update may be a non-fast-forward. On by default.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn created(&self) -> &CreatedObjects {
        &self.created
    }

    pub async fn run(&mut self, request: &CopyRequest) -> Result<CopyOutcome, CopyError> {
        info!(source = %request.source, destination = %request.destination, "walking source tree");
        let files = walk_tree(self.api, &request.source).await?;
        info!(count = files.len(), "found files");

        let entries = self.upload_blobs(request, &files).await?;

        let parent_sha = resolve_branch_tip(self.api, DEFAULT_BRANCH)
            .await?
            .into_commit_sha()?;
        info!(branch = DEFAULT_BRANCH, tip = %parent_sha, "resolved branch tip");

        let tree_sha = self.build_tree(&parent_sha, &entries).await?;
        let commit_sha = self
            .commit_and_advance(request, &tree_sha, &parent_sha)
            .await?;

        Ok(CopyOutcome {
            commit_sha,
            tree_sha,
            parent_sha,
            entries,
        })
    }

    /// One create-blob request per file, in walk order. Identical content is
    /// uploaded again rather than reused.
    pub async fn upload_blobs(
        &mut self,
        request: &CopyRequest,
        files: &[WalkedFile],
    ) -> Result<Vec<NewTreeEntry>, CopyError> {
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let path = rewrite_path(&file.path, &request.source, &request.destination)?;
            let sha = self
                .api
                .create_blob(&NewBlob::from_bytes(&file.content))
                .await?;
            debug!(from = %file.path, to = %path, %sha, "uploaded blob");
            self.created.blobs.push(sha.clone());
            entries.push(NewTreeEntry::blob(path, sha));
        }
        info!(count = entries.len(), "uploaded blobs");
        Ok(entries)
    }

    /// Layer `entries` over the tree of commit `tip`.
    pub async fn build_tree(
        &mut self,
        tip: &str,
        entries: &[NewTreeEntry],
    ) -> Result<String, CopyError> {
        let base = self.api.get_commit(tip).await?;
        let sha = self.api.create_tree(&base.tree.sha, entries).await?;
        info!(base_tree = %base.tree.sha, tree = %sha, "created tree");
        self.created.tree = Some(sha.clone());
        Ok(sha)
    }

    pub async fn commit_and_advance(
        &mut self,
        request: &CopyRequest,
        tree: &str,
        parent: &str,
    ) -> Result<String, CopyError> {
        let sha = self
            .api
            .create_commit(&request.commit_message(), tree, &[parent.to_string()])
            .await?;
        info!(commit = %sha, "created commit");
        self.created.commit = Some(sha.clone());

        self.api
            .update_ref(&format!("heads/{DEFAULT_BRANCH}"), &sha, self.force)
            .await?;
        info!(branch = DEFAULT_BRANCH, commit = %sha, "advanced branch");
        Ok(sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryRemote, Operation};

    #[test]
    fn request_normalizes_paths() {
        let req = CopyRequest::new("/a/b/", "c/d/");
        assert_eq!(req.source, "a/b");
        assert_eq!(req.destination, "c/d");
        assert_eq!(req.commit_message(), "moved items from a/b to c/d");
    }

    #[tokio::test]
    async fn uploads_one_blob_per_file_without_dedup() {
        let remote = InMemoryRemote::new();
        let files = vec![
            WalkedFile {
                path: "a/x.txt".to_string(),
                content: b"same".to_vec(),
            },
            WalkedFile {
                path: "a/y.txt".to_string(),
                content: b"same".to_vec(),
            },
        ];
        let mut copier = Copier::new(&remote);
        let entries = copier
            .upload_blobs(&CopyRequest::new("a", "b"), &files)
            .await
            .unwrap();

        assert_eq!(remote.count_calls(Operation::CreateBlob), 2);
        assert_eq!(entries[0].path, "b/x.txt");
        assert_eq!(entries[1].path, "b/y.txt");
        assert_eq!(entries[0].sha, entries[1].sha);
        assert_eq!(copier.created().blobs.len(), 2);
    }

    #[tokio::test]
    async fn path_outside_source_uploads_nothing() {
        let remote = InMemoryRemote::new();
        let files = vec![WalkedFile {
            path: "elsewhere/x.txt".to_string(),
            content: b"x".to_vec(),
        }];
        let mut copier = Copier::new(&remote);
        let err = copier
            .upload_blobs(&CopyRequest::new("a", "b"), &files)
            .await
            .unwrap_err();

        assert!(matches!(err, CopyError::PathOutsideSource { .. }));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn build_tree_keeps_base_entries() {
        let remote = InMemoryRemote::new();
        let tip = remote.seed_branch("main", &[("keep.txt", b"k".as_slice())]);
        let blob = remote.create_blob(&NewBlob::from_bytes(b"n")).await.unwrap();

        let mut copier = Copier::new(&remote);
        let tree = copier
            .build_tree(&tip, &[NewTreeEntry::blob("new/n.txt", blob)])
            .await
            .unwrap();

        assert_eq!(
            remote.tree_paths(&tree).unwrap(),
            vec!["keep.txt".to_string(), "new/n.txt".to_string()]
        );
        assert_eq!(copier.created().tree.as_deref(), Some(tree.as_str()));
    }

    #[tokio::test]
    async fn ref_update_failure_leaves_commit_orphaned() {
        let remote = InMemoryRemote::new();
        let tip = remote.seed_branch("main", &[("f", b"f".as_slice())]);
        let tree = remote.commit(&tip).unwrap().tree.sha;
        remote.fail_on(Operation::UpdateRef, 409);

        let mut copier = Copier::new(&remote);
        let err = copier
            .commit_and_advance(&CopyRequest::new("a", "b"), &tree, &tip)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(remote.branch_tip("main"), Some(tip));
        let orphan = copier.created().commit.clone().unwrap();
        assert!(remote.commit(&orphan).is_some());
    }
}
