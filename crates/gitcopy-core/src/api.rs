use async_trait::async_trait;

use crate::types::{ContentsResponse, GitBlob, GitCommit, GitRef, NewBlob, NewTreeEntry};
use crate::CopyError;

/// Name of the only branch the copy pipeline reads and advances.
pub const DEFAULT_BRANCH: &str = "main";

/// The slice of the GitHub REST API used by the copy pipeline, scoped to one
/// repository.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// `GET contents/{path}`.
    async fn get_contents(&self, path: &str) -> Result<ContentsResponse, CopyError>;

    /// Follow the `url` of a contents entry.
    async fn get_contents_by_url(&self, url: &str) -> Result<ContentsResponse, CopyError>;

    /// Follow the `git_url` of a contents entry.
    async fn get_blob_by_url(&self, url: &str) -> Result<GitBlob, CopyError>;

    /// Returns the sha of the new blob.
    async fn create_blob(&self, blob: &NewBlob) -> Result<String, CopyError>;

    async fn list_refs(&self) -> Result<Vec<GitRef>, CopyError>;

    async fn get_commit(&self, sha: &str) -> Result<GitCommit, CopyError>;

    /// Returns the sha of the new tree.
    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[NewTreeEntry],
    ) -> Result<String, CopyError>;

    /// Returns the sha of the new commit.
    async fn create_commit(
        &self,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String, CopyError>;

    /// `ref_name` is relative to `refs/`, e.g. `heads/main`.
    async fn update_ref(&self, ref_name: &str, sha: &str, force: bool) -> Result<(), CopyError>;
}
