//! In-process stand-in for a GitHub repository.
//!
//! Objects live in hash maps keyed by a content hash; trees are flat maps from
//! full path to blob sha. The contents API is served from the tip of the
//! repository's default branch. Every call is recorded, and any operation can
//! be made to fail with a chosen status.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use base64::prelude::*;

use crate::api::GitHubApi;
use crate::types::{
    ContentEntry, ContentKind, ContentsResponse, GitBlob, GitCommit, GitRef, GitRefObject,
    NewBlob, NewTreeEntry, ShaRef,
};
use crate::CopyError;

const CONTENTS_URL: &str = "mem://contents/";
const BLOBS_URL: &str = "mem://blobs/";

/// Files above this size are listed without inline content, like GitHub does
/// for files over 1 MB.
pub const DEFAULT_INLINE_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetContents,
    GetContentsByUrl,
    GetBlob,
    CreateBlob,
    ListRefs,
    GetCommit,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    tree: String,
    parents: Vec<String>,
    message: String,
}

#[derive(Debug)]
struct State {
    default_branch: String,
    inline_limit: usize,
    inline_listings: bool,
    blobs: HashMap<String, Vec<u8>>,
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, StoredCommit>,
    refs: BTreeMap<String, String>,
    failures: HashMap<Operation, u16>,
    calls: Vec<Operation>,
    sequence: u64,
}

#[derive(Debug)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn object_id(kind: &str, parts: &[&[u8]]) -> String {
    let mut hasher = DefaultHasher::new();
    kind.hash(&mut hasher);
    for part in parts {
        part.hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}

fn tree_id(entries: &BTreeMap<String, String>) -> String {
    let flat: Vec<u8> = entries
        .iter()
        .flat_map(|(path, sha)| format!("{path}\0{sha}\n").into_bytes())
        .collect();
    object_id("tree", &[flat.as_slice()])
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}

impl State {
    fn record(&mut self, op: Operation) -> Result<(), CopyError> {
        self.calls.push(op);
        match self.failures.get(&op) {
            Some(status) => Err(CopyError::api(
                format!("{op:?} failed"),
                *status,
                error_body("injected failure"),
            )),
            None => Ok(()),
        }
    }

    fn store_blob(&mut self, bytes: Vec<u8>) -> String {
        let sha = object_id("blob", &[bytes.as_slice()]);
        self.blobs.insert(sha.clone(), bytes);
        sha
    }

    fn store_tree(&mut self, entries: BTreeMap<String, String>) -> String {
        let sha = tree_id(&entries);
        self.trees.insert(sha.clone(), entries);
        sha
    }

    fn store_commit(&mut self, commit: StoredCommit) -> String {
        // Real commits carry a timestamp, so identical content still yields
        // distinct commits.
        self.sequence += 1;
        let seq = self.sequence.to_le_bytes();
        let parents = commit.parents.join(",");
        let sha = object_id(
            "commit",
            &[
                commit.tree.as_bytes(),
                parents.as_bytes(),
                commit.message.as_bytes(),
                seq.as_slice(),
            ],
        );
        self.commits.insert(sha.clone(), commit);
        sha
    }

    fn branch_files(&self, branch: &str) -> Option<&BTreeMap<String, String>> {
        let commit = self.refs.get(&format!("refs/heads/{branch}"))?;
        let tree = &self.commits.get(commit)?.tree;
        self.trees.get(tree)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut stack = vec![descendant.to_string()];
        while let Some(sha) = stack.pop() {
            if sha == ancestor {
                return true;
            }
            if let Some(commit) = self.commits.get(&sha) {
                stack.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    fn file_entry(&self, path: &str, sha: &str, inline: bool) -> ContentEntry {
        let mut entry = ContentEntry {
            kind: ContentKind::File,
            path: path.to_string(),
            sha: sha.to_string(),
            url: format!("{CONTENTS_URL}{path}"),
            git_url: Some(format!("{BLOBS_URL}{sha}")),
            content: None,
            encoding: None,
        };
        if inline {
            let bytes = &self.blobs[sha];
            if bytes.len() > self.inline_limit {
                entry.content = Some(String::new());
                entry.encoding = Some("none".to_string());
            } else {
                entry.content = Some(BASE64_STANDARD.encode(bytes));
                entry.encoding = Some("base64".to_string());
            }
        }
        entry
    }

    fn contents(&self, path: &str) -> Result<ContentsResponse, CopyError> {
        let not_found = || CopyError::api("get contents failed", 404, error_body("Not Found"));
        let path = path.trim_matches('/');
        let files = self
            .branch_files(&self.default_branch)
            .ok_or_else(not_found)?;

        if let Some(sha) = files.get(path) {
            return Ok(ContentsResponse::Entry(self.file_entry(path, sha, true)));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut children: BTreeMap<String, Option<String>> = BTreeMap::new();
        for (file, sha) in files.range(prefix.clone()..) {
            let Some(rest) = file.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((dir, _)) => children.insert(format!("{prefix}{dir}"), None),
                None => children.insert(file.clone(), Some(sha.clone())),
            };
        }
        if children.is_empty() {
            return Err(not_found());
        }

        Ok(ContentsResponse::Listing(
            children
                .into_iter()
                .map(|(child, sha)| match sha {
                    Some(sha) => self.file_entry(&child, &sha, self.inline_listings),
                    None => ContentEntry {
                        kind: ContentKind::Dir,
                        url: format!("{CONTENTS_URL}{child}"),
                        path: child,
                        sha: String::new(),
                        git_url: None,
                        content: None,
                        encoding: None,
                    },
                })
                .collect(),
        ))
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                default_branch: "main".to_string(),
                inline_limit: DEFAULT_INLINE_LIMIT,
                inline_listings: false,
                blobs: HashMap::new(),
                trees: HashMap::new(),
                commits: HashMap::new(),
                refs: BTreeMap::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
                sequence: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Branch whose tip backs the contents API.
    pub fn set_default_branch(&self, branch: &str) {
        self.lock().default_branch = branch.to_string();
    }

    pub fn set_inline_limit(&self, limit: usize) {
        self.lock().inline_limit = limit;
    }

    /// Include base64 content for files in directory listings.
    pub fn set_inline_listings(&self, inline: bool) {
        self.lock().inline_listings = inline;
    }

    /// Make every later call to `op` fail with `status`.
    pub fn fail_on(&self, op: Operation, status: u16) {
        self.lock().failures.insert(op, status);
    }

    /// Create a root commit holding `files` and point `refs/heads/{branch}` at it.
    pub fn seed_branch(&self, branch: &str, files: &[(&str, &[u8])]) -> String {
        let mut state = self.lock();
        let mut entries = BTreeMap::new();
        for (path, bytes) in files {
            let sha = state.store_blob(bytes.to_vec());
            entries.insert(path.trim_matches('/').to_string(), sha);
        }
        let tree = state.store_tree(entries);
        let commit = state.store_commit(StoredCommit {
            tree,
            parents: Vec::new(),
            message: "initial".to_string(),
        });
        state
            .refs
            .insert(format!("refs/heads/{branch}"), commit.clone());
        commit
    }

    pub fn branch_tip(&self, branch: &str) -> Option<String> {
        self.lock().refs.get(&format!("refs/heads/{branch}")).cloned()
    }

    /// Contents of `path` in the tree at the tip of `branch`.
    pub fn file_at(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.lock();
        let sha = state.branch_files(branch)?.get(path)?;
        state.blobs.get(sha).cloned()
    }

    pub fn tree_paths(&self, tree_sha: &str) -> Option<Vec<String>> {
        self.lock()
            .trees
            .get(tree_sha)
            .map(|t| t.keys().cloned().collect())
    }

    pub fn commit(&self, sha: &str) -> Option<GitCommit> {
        let state = self.lock();
        state.commits.get(sha).map(|c| GitCommit {
            sha: sha.to_string(),
            tree: ShaRef {
                sha: c.tree.clone(),
            },
            parents: c
                .parents
                .iter()
                .map(|p| ShaRef { sha: p.clone() })
                .collect(),
            message: c.message.clone(),
        })
    }

    pub fn has_blob(&self, sha: &str) -> bool {
        self.lock().blobs.contains_key(sha)
    }

    pub fn blob_count(&self) -> usize {
        self.lock().blobs.len()
    }

    pub fn commit_count(&self) -> usize {
        self.lock().commits.len()
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, op: Operation) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }
}

#[async_trait]
impl GitHubApi for InMemoryRemote {
    async fn get_contents(&self, path: &str) -> Result<ContentsResponse, CopyError> {
        let mut state = self.lock();
        state.record(Operation::GetContents)?;
        state.contents(path)
    }

    async fn get_contents_by_url(&self, url: &str) -> Result<ContentsResponse, CopyError> {
        let mut state = self.lock();
        state.record(Operation::GetContentsByUrl)?;
        let path = url
            .strip_prefix(CONTENTS_URL)
            .ok_or_else(|| CopyError::api("get content failed", 404, error_body("Not Found")))?;
        state.contents(path)
    }

    async fn get_blob_by_url(&self, url: &str) -> Result<GitBlob, CopyError> {
        let mut state = self.lock();
        state.record(Operation::GetBlob)?;
        let sha = url.strip_prefix(BLOBS_URL).unwrap_or(url);
        let bytes = state
            .blobs
            .get(sha)
            .ok_or_else(|| CopyError::api("get blob failed", 404, error_body("Not Found")))?;
        Ok(GitBlob {
            sha: sha.to_string(),
            content: BASE64_STANDARD.encode(bytes),
            encoding: "base64".to_string(),
        })
    }

    async fn create_blob(&self, blob: &NewBlob) -> Result<String, CopyError> {
        let mut state = self.lock();
        state.record(Operation::CreateBlob)?;
        let bytes = blob.to_bytes()?;
        Ok(state.store_blob(bytes))
    }

    async fn list_refs(&self) -> Result<Vec<GitRef>, CopyError> {
        let mut state = self.lock();
        state.record(Operation::ListRefs)?;
        Ok(state
            .refs
            .iter()
            .map(|(name, sha)| GitRef {
                name: name.clone(),
                object: GitRefObject {
                    sha: sha.clone(),
                    kind: "commit".to_string(),
                },
            })
            .collect())
    }

    async fn get_commit(&self, sha: &str) -> Result<GitCommit, CopyError> {
        self.lock().record(Operation::GetCommit)?;
        self.commit(sha)
            .ok_or_else(|| CopyError::api("get commit failed", 404, error_body("Not Found")))
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[NewTreeEntry],
    ) -> Result<String, CopyError> {
        let mut state = self.lock();
        state.record(Operation::CreateTree)?;
        let mut files = state.trees.get(base_tree).cloned().ok_or_else(|| {
            CopyError::api("create tree failed", 422, error_body("Invalid base_tree"))
        })?;
        for entry in entries {
            if !state.blobs.contains_key(&entry.sha) {
                return Err(CopyError::api(
                    "create tree failed",
                    422,
                    error_body("Invalid tree info"),
                ));
            }
            files.insert(entry.path.clone(), entry.sha.clone());
        }
        Ok(state.store_tree(files))
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String, CopyError> {
        let mut state = self.lock();
        state.record(Operation::CreateCommit)?;
        let known = state.trees.contains_key(tree)
            && parents.iter().all(|p| state.commits.contains_key(p));
        if !known {
            return Err(CopyError::api(
                "create commit failed",
                422,
                error_body("Invalid tree or parent"),
            ));
        }
        Ok(state.store_commit(StoredCommit {
            tree: tree.to_string(),
            parents: parents.to_vec(),
            message: message.to_string(),
        }))
    }

    async fn update_ref(&self, ref_name: &str, sha: &str, force: bool) -> Result<(), CopyError> {
        let mut state = self.lock();
        state.record(Operation::UpdateRef)?;
        let full = format!("refs/{}", ref_name.trim_matches('/'));
        let current = state.refs.get(&full).cloned().ok_or_else(|| {
            CopyError::api(
                "update ref failed",
                422,
                error_body("Reference does not exist"),
            )
        })?;
        if !state.commits.contains_key(sha) {
            return Err(CopyError::api(
                "update ref failed",
                422,
                error_body("Object does not exist"),
            ));
        }
        if !force && !state.is_ancestor(&current, sha) {
            return Err(CopyError::api(
                "update ref failed",
                422,
                error_body("Update is not a fast forward"),
            ));
        }
        state.refs.insert(full, sha.to_string());
        Ok(())
    }
}
