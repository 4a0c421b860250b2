//! Payloads exchanged with the GitHub REST API.
//!
//! Only the fields the copy pipeline reads or writes are modelled; everything
//! else in a response is ignored by serde.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Mode used for every entry written by the tree builder.
pub const FILE_MODE_REGULAR: &str = "100644";

// ---------------------------------------------------------------------------
// Contents API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of `GET /repos/{owner}/{repo}/contents/{path}`.
///
/// Directory listings never carry `content`; single-file responses carry it
/// base64-encoded unless the file is too large, in which case `content` is
/// empty and `encoding` is `"none"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub path: String,
    #[serde(default)]
    pub sha: String,
    pub url: String,
    #[serde(default)]
    pub git_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl ContentEntry {
    /// Base64 payload carried inline with this entry, if any. An empty
    /// payload is an empty file; only `encoding: "none"` means omitted.
    pub fn inline_content(&self) -> Option<&str> {
        if self.kind != ContentKind::File {
            return None;
        }
        if self.encoding.as_deref() == Some("none") {
            return None;
        }
        self.content.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    Entry(ContentEntry),
}

// ---------------------------------------------------------------------------
// Git database API
// ---------------------------------------------------------------------------

/// Response of `GET /repos/{owner}/{repo}/git/blobs/{sha}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitBlob {
    #[serde(default)]
    pub sha: String,
    pub content: String,
    pub encoding: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

/// Body of `POST /repos/{owner}/{repo}/git/blobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlob {
    pub content: String,
    pub encoding: BlobEncoding,
}

impl NewBlob {
    /// Text goes up as-is; anything that is not UTF-8 is base64-encoded so the
    /// stored bytes match the source exactly.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self {
                content: text.to_string(),
                encoding: BlobEncoding::Utf8,
            },
            Err(_) => Self {
                content: BASE64_STANDARD.encode(bytes),
                encoding: BlobEncoding::Base64,
            },
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self.encoding {
            BlobEncoding::Utf8 => Ok(self.content.as_bytes().to_vec()),
            BlobEncoding::Base64 => BASE64_STANDARD.decode(&self.content),
        }
    }
}

/// The `{ "sha": ... }` part of any create-object response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitRefObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// One entry of `GET /repos/{owner}/{repo}/git/refs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitRefObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

impl NewTreeEntry {
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FILE_MODE_REGULAR.to_string(),
            kind: "blob".to_string(),
            sha: sha.into(),
        }
    }
}

/// Body of `POST /repos/{owner}/{repo}/git/trees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTreeRequest {
    pub base_tree: String,
    pub tree: Vec<NewTreeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaRef {
    pub sha: String,
}

/// Response of `GET /repos/{owner}/{repo}/git/commits/{sha}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree: ShaRef,
    #[serde(default)]
    pub parents: Vec<ShaRef>,
    #[serde(default)]
    pub message: String,
}

/// Body of `POST /repos/{owner}/{repo}/git/commits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Body of `PATCH /repos/{owner}/{repo}/git/refs/{ref}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRefRequest {
    pub sha: String,
    pub force: bool,
}
