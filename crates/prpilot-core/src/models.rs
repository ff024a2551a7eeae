//! Read-only projections of GitHub data returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Patch text substituted when GitHub cannot produce a diff for a file
/// (binary files, oversized diffs)
pub const NO_PATCH_PLACEHOLDER: &str = "(No patch available)";

/// One open pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    /// Login of the PR author
    pub author: String,
    pub body: Option<String>,
    /// Browser URL of the PR
    pub url: String,
    pub commit_count: u64,
}

/// Unified diff for one file of a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub filename: String,
    /// Patch text, or [`NO_PATCH_PLACEHOLDER`]
    pub patch: String,
}

impl FileDiff {
    pub fn new(filename: impl Into<String>, patch: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            patch: patch.unwrap_or_else(|| NO_PATCH_PLACEHOLDER.to_string()),
        }
    }
}

/// One commit of a pull request together with its per-file diffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitWithDiffs {
    pub sha: String,
    pub message: String,
    /// Login of the linked GitHub user, empty when the commit author has no account
    pub author: String,
    pub date: DateTime<Utc>,
    pub files: Vec<FileDiff>,
}

/// Aggregate state of legacy commit statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Success,
    Failure,
    Pending,
    Error,
    #[serde(other)]
    Unknown,
}

/// One legacy status context reported for a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub context: String,
    pub state: CommitState,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Combined status rollup for a PR's head commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedStatus {
    pub state: CommitState,
    pub checks: Vec<StatusCheck>,
}

/// Inline annotation attached to a check run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckAnnotation {
    pub path: String,
    pub start_line: u64,
    pub end_line: u64,
    /// `notice`, `warning` or `failure`
    pub annotation_level: Option<String>,
    pub message: Option<String>,
    pub title: Option<String>,
}

/// Summary of one check run on a PR's head commit
///
/// Annotations are limited to the first page GitHub returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRunSummary {
    pub title: String,
    /// Conclusion when the run has finished, otherwise its current status
    pub status: String,
    pub summary: String,
    pub annotations: Vec<CheckAnnotation>,
    pub details_url: Option<String>,
}

/// Profile of the user owning the session's token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

/// File changed by a pull request, as input for an AI review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub patch: Option<String>,
}
