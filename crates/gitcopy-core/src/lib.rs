pub mod api;
pub mod branch;
pub mod copy;
pub mod error;
pub mod http_client;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod path;
pub mod types;
pub mod walker;

pub use api::{GitHubApi, DEFAULT_BRANCH};
pub use copy::{CopyOutcome, CopyRequest, Copier, CreatedObjects};
pub use error::CopyError;
pub use http_client::HttpGitHubClient;
