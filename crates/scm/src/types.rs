//! Wire types for the subset of the forge REST surface the core consumes.

use serde::{Deserialize, Serialize};

/// A repository's identity and default branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub id: u64,
    pub default_branch: String,
}

/// One file changed in a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFile {
    pub filename: String,
    pub status: String,
}

/// Content of a file fetched at a specific ref.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub content: Vec<u8>,
    pub sha: String,
}

/// A git ref (branch or tag) pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefInfo {
    pub sha: String,
}

/// A commit's tree pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub tree_sha: String,
}

/// A newly created blob's sha.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobInfo {
    pub sha: String,
}

/// A newly created tree's sha.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeInfo {
    pub sha: String,
}

/// One entry in a tree-creation request.
#[derive(Debug, Clone, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub sha: String,
}

impl TreeEntry {
    /// A regular (non-executable) file entry pointing at an existing blob.
    #[must_use]
    pub fn file(path: impl Into<String>, blob_sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644".to_string(),
            entry_type: "blob".to_string(),
            sha: blob_sha.into(),
        }
    }
}

/// Commit status state, as accepted by the checks/statuses API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

/// A created pull request's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrInfo {
    pub number: u64,
    pub url: String,
}

/// One inline review comment.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewComment {
    pub path: String,
    pub line: u32,
    pub body: String,
}

/// State of an individual CI check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub html_url: Option<String>,
}

/// An annotation attached to a check run's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub message: String,
    #[serde(default)]
    pub annotation_level: Option<String>,
}

/// One context in the combined-status API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusContext {
    pub context: String,
    pub state: String,
    pub description: Option<String>,
}

/// The combined result of checks + statuses for a ref.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedStatus {
    #[serde(default)]
    pub statuses: Vec<StatusContext>,
}
