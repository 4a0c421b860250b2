use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::GitHubApi;
use crate::types::{
    ContentsResponse, CreateCommitRequest, CreateTreeRequest, CreatedObject, GitBlob, GitCommit,
    GitRef, NewBlob, NewTreeEntry, UpdateRefRequest,
};
use crate::CopyError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("gitcopy/", env!("CARGO_PKG_VERSION"));

/// GitHub REST client scoped to a single repository.
///
/// Requests are sent one at a time with the HTTP client's default timeouts.
/// Any non-2xx status is turned into [`CopyError::Api`] carrying the raw
/// response body.
#[derive(Debug, Clone)]
pub struct HttpGitHubClient {
    api_url: String,
    owner: String,
    repo: String,
    token: String,
    client: reqwest::Client,
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl HttpGitHubClient {
    pub fn new(api_url: String, owner: String, repo: String, token: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            owner,
            repo,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_url,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo),
            suffix
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        debug!(%method, %url, "github request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, CopyError> {
        let resp = builder.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CopyError::api(context, status.as_u16(), body));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl GitHubApi for HttpGitHubClient {
    async fn get_contents(&self, path: &str) -> Result<ContentsResponse, CopyError> {
        let url = self.endpoint(&format!("/contents/{}", encode_path(path)));
        self.send(
            self.request(reqwest::Method::GET, url),
            "get repository contents failed",
        )
        .await
    }

    async fn get_contents_by_url(&self, url: &str) -> Result<ContentsResponse, CopyError> {
        self.send(
            self.request(reqwest::Method::GET, url.to_string()),
            "get content failed",
        )
        .await
    }

    async fn get_blob_by_url(&self, url: &str) -> Result<GitBlob, CopyError> {
        self.send(
            self.request(reqwest::Method::GET, url.to_string()),
            "get blob failed",
        )
        .await
    }

    async fn create_blob(&self, blob: &NewBlob) -> Result<String, CopyError> {
        let url = self.endpoint("/git/blobs");
        let created: CreatedObject = self
            .send(
                self.request(reqwest::Method::POST, url).json(blob),
                "blob upload failed",
            )
            .await?;
        Ok(created.sha)
    }

    async fn list_refs(&self) -> Result<Vec<GitRef>, CopyError> {
        let url = self.endpoint("/git/refs");
        self.send(
            self.request(reqwest::Method::GET, url),
            "list refs failed",
        )
        .await
    }

    async fn get_commit(&self, sha: &str) -> Result<GitCommit, CopyError> {
        let url = self.endpoint(&format!("/git/commits/{}", urlencoding::encode(sha)));
        self.send(
            self.request(reqwest::Method::GET, url),
            "get commit failed",
        )
        .await
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[NewTreeEntry],
    ) -> Result<String, CopyError> {
        let url = self.endpoint("/git/trees");
        let payload = CreateTreeRequest {
            base_tree: base_tree.to_string(),
            tree: entries.to_vec(),
        };
        let created: CreatedObject = self
            .send(
                self.request(reqwest::Method::POST, url).json(&payload),
                "create tree failed",
            )
            .await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String, CopyError> {
        let url = self.endpoint("/git/commits");
        let payload = CreateCommitRequest {
            message: message.to_string(),
            tree: tree.to_string(),
            parents: parents.to_vec(),
        };
        let created: CreatedObject = self
            .send(
                self.request(reqwest::Method::POST, url).json(&payload),
                "create commit failed",
            )
            .await?;
        Ok(created.sha)
    }

    async fn update_ref(&self, ref_name: &str, sha: &str, force: bool) -> Result<(), CopyError> {
        let url = self.endpoint(&format!("/git/refs/{}", encode_path(ref_name)));
        let payload = UpdateRefRequest {
            sha: sha.to_string(),
            force,
        };
        let body: serde_json::Value = self
            .send(
                self.request(reqwest::Method::PATCH, url).json(&payload),
                "update ref failed",
            )
            .await?;
        debug!(%body, "ref updated");
        Ok(())
    }
}
