use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use gitcopy_core::{Copier, CopyRequest, HttpGitHubClient};

use crate::config::Config;

#[derive(Args)]
pub struct CopyArgs {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Path to copy from
    pub src: String,
    /// Path to copy to
    pub dest: String,
    /// Refuse to move the branch unless the update is a fast-forward
    #[arg(long)]
    pub no_force: bool,
}

pub async fn run(args: CopyArgs, config: &Config) -> anyhow::Result<()> {
    let client = HttpGitHubClient::new(
        config.api_url.clone(),
        args.owner.clone(),
        args.repo.clone(),
        config.token.clone(),
    );
    let request = CopyRequest::new(&args.src, &args.dest);
    let mut copier = Copier::new(&client).force(!args.no_force);

    match copier.run(&request).await {
        Ok(outcome) => {
            info!(
                commit = %outcome.commit_sha,
                parent = %outcome.parent_sha,
                files = outcome.entries.len(),
                "copy committed"
            );
            println!("SUCCESS, files copied from {} to {}", args.src, args.dest);
            Ok(())
        }
        Err(err) => {
            let created = copier.created();
            if !created.is_empty() {
                warn!(
                    blobs = created.blobs.len(),
                    tree = ?created.tree,
                    commit = ?created.commit,
                    "objects created before the failure were left on the remote"
                );
            }
            Err(err).with_context(|| {
                format!(
                    "copying {} to {} in {}/{} failed",
                    args.src, args.dest, args.owner, args.repo
                )
            })
        }
    }
}
