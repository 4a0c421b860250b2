use base64::prelude::*;
use tracing::{debug, warn};

use crate::api::GitHubApi;
use crate::types::{ContentEntry, ContentKind, ContentsResponse, GitBlob};
use crate::CopyError;

/// A file found under the source path, with its decoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub path: String,
    pub content: Vec<u8>,
}

/// Worklist item. `followed` is set once the entry came from its own `url`,
/// so a file still lacking content is read through its git blob instead.
struct Pending {
    entry: ContentEntry,
    followed: bool,
}

/// GitHub wraps base64 content at 60 columns.
pub fn decode_content(content: &str) -> Result<Vec<u8>, CopyError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(BASE64_STANDARD.decode(compact)?)
}

fn decode_blob(blob: &GitBlob) -> Result<Vec<u8>, CopyError> {
    match blob.encoding.as_str() {
        "base64" => decode_content(&blob.content),
        "utf-8" | "utf8" => Ok(blob.content.as_bytes().to_vec()),
        other => Err(CopyError::UnexpectedContent(format!(
            "blob {} has unsupported encoding {other}",
            blob.sha
        ))),
    }
}

fn push_response(stack: &mut Vec<Pending>, resp: ContentsResponse) {
    match resp {
        // Reversed so entries pop in listing order.
        ContentsResponse::Listing(entries) => stack.extend(
            entries
                .into_iter()
                .rev()
                .map(|entry| Pending {
                    entry,
                    followed: false,
                }),
        ),
        ContentsResponse::Entry(entry) => stack.push(Pending {
            entry,
            followed: true,
        }),
    }
}

/// List every file under `root` depth-first, in listing order.
///
/// Directories are expanded with an extra request each. Files whose content
/// is not inline are fetched through their contents `url`, then through
/// their git blob if the contents API still omits the body. Symlinks and
/// submodules are skipped.
pub async fn walk_tree(api: &dyn GitHubApi, root: &str) -> Result<Vec<WalkedFile>, CopyError> {
    let mut stack = Vec::new();
    push_response(&mut stack, api.get_contents(root).await?);

    let mut files = Vec::new();
    while let Some(Pending { entry, followed }) = stack.pop() {
        match entry.kind {
            ContentKind::File => {
                if let Some(content) = entry.inline_content() {
                    files.push(WalkedFile {
                        content: decode_content(content)?,
                        path: entry.path,
                    });
                } else if !followed {
                    debug!(path = %entry.path, "fetching file content");
                    push_response(&mut stack, api.get_contents_by_url(&entry.url).await?);
                } else if let Some(git_url) = &entry.git_url {
                    debug!(path = %entry.path, "fetching oversized file as blob");
                    let blob = api.get_blob_by_url(git_url).await?;
                    files.push(WalkedFile {
                        content: decode_blob(&blob)?,
                        path: entry.path,
                    });
                } else {
                    return Err(CopyError::UnexpectedContent(format!(
                        "no content available for {}",
                        entry.path
                    )));
                }
            }
            ContentKind::Dir => {
                debug!(path = %entry.path, "listing directory");
                let resp = api.get_contents_by_url(&entry.url).await?;
                if let ContentsResponse::Listing(entries) = resp {
                    push_response(&mut stack, ContentsResponse::Listing(entries));
                } else {
                    return Err(CopyError::UnexpectedContent(format!(
                        "directory {} did not return a listing",
                        entry.path
                    )));
                }
            }
            kind => warn!(path = %entry.path, ?kind, "skipping unsupported entry"),
        }
    }

    Ok(files)
}
