use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("{context}: {status} body={body}")]
    Api {
        context: String,
        status: u16,
        body: String,
    },
    #[error("branch not found: {0}")]
    BranchNotFound(String),
    #[error("path {path} is not under source path {source_path}")]
    PathOutsideSource { path: String, source_path: String },
    #[error("unexpected content: {0}")]
    UnexpectedContent(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl CopyError {
    pub fn api(context: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        CopyError::Api {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    /// HTTP status of a failed API call, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CopyError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
