use tracing::debug;

use crate::api::GitHubApi;
use crate::CopyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchTip {
    Found { commit_sha: String },
    NotFound { branch: String },
}

impl BranchTip {
    pub fn into_commit_sha(self) -> Result<String, CopyError> {
        match self {
            BranchTip::Found { commit_sha } => Ok(commit_sha),
            BranchTip::NotFound { branch } => Err(CopyError::BranchNotFound(branch)),
        }
    }
}

/// Look up the commit at the head of `refs/heads/{branch}` by scanning the
/// full ref listing.
pub async fn resolve_branch_tip(
    api: &dyn GitHubApi,
    branch: &str,
) -> Result<BranchTip, CopyError> {
    let wanted = format!("refs/heads/{branch}");
    let refs = api.list_refs().await?;
    debug!(count = refs.len(), "listed refs");

    Ok(refs
        .into_iter()
        .find(|r| r.name == wanted)
        .map(|r| BranchTip::Found {
            commit_sha: r.object.sha,
        })
        .unwrap_or_else(|| BranchTip::NotFound {
            branch: branch.to_string(),
        }))
}
