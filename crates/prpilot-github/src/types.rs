//! GitHub REST payloads and their mapping onto prpilot projections
//!
//! Only the fields prpilot reads are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use prpilot_core::{
    AuthenticatedUser, ChangedFile, CheckAnnotation, CheckRunSummary, CombinedStatus,
    CommitState, CommitWithDiffs, FileDiff, PullRequestSummary, StatusCheck,
};
use serde::{Deserialize, Serialize};

/// Error body GitHub sends with non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleUser {
    pub login: String,
}

/// `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    pub sha: String,
}

/// Entry of `GET /repos/{owner}/{repo}/pulls` or `GET …/pulls/{number}`
///
/// `commits` is only present on the single-PR endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub user: Option<SimpleUser>,
    pub body: Option<String>,
    pub html_url: String,
    pub head: GitRef,
    #[serde(default)]
    pub commits: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitSignature {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: GitSignature,
}

/// Entry of `GET …/pulls/{number}/commits`
#[derive(Debug, Clone, Deserialize)]
pub struct PullCommit {
    pub sha: String,
}

/// `GET …/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
    /// GitHub account linked to the commit author, if any
    pub author: Option<SimpleUser>,
    #[serde(default)]
    pub files: Vec<DiffEntry>,
}

/// Changed file in a commit or pull request. `patch` is missing for binary
/// and oversized diffs.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffEntry {
    pub filename: String,
    #[serde(default)]
    pub patch: Option<String>,
}

/// `GET …/commits/{sha}/status`
#[derive(Debug, Clone, Deserialize)]
pub struct CombinedStatusResponse {
    pub state: CommitState,
    #[serde(default)]
    pub statuses: Vec<Status>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub context: String,
    pub state: CommitState,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `GET …/commits/{sha}/check-runs`
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRunsResponse {
    #[serde(default)]
    pub check_runs: Vec<CheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub details_url: Option<String>,
    #[serde(default)]
    pub output: CheckRunOutput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRunOutput {
    pub summary: Option<String>,
    #[serde(default)]
    pub annotations_count: u64,
}

/// Entry of `GET …/check-runs/{id}/annotations`
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub start_line: u64,
    pub end_line: u64,
    /// Nullable in GitHub's schema
    pub annotation_level: Option<String>,
    pub message: Option<String>,
    pub title: Option<String>,
}

/// Body of `POST …/pulls/{number}/reviews`
#[derive(Debug, Clone, Serialize)]
pub struct CreateReviewRequest<'a> {
    pub event: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub id: u64,
}

// ==================== Mapping ====================

impl From<PullRequest> for PullRequestSummary {
    fn from(pr: PullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            body: pr.body,
            url: pr.html_url,
            commit_count: pr.commits.unwrap_or(0),
        }
    }
}

impl From<DiffEntry> for FileDiff {
    fn from(entry: DiffEntry) -> Self {
        FileDiff::new(entry.filename, entry.patch)
    }
}

impl From<DiffEntry> for ChangedFile {
    fn from(entry: DiffEntry) -> Self {
        Self {
            filename: entry.filename,
            patch: entry.patch,
        }
    }
}

impl From<Commit> for CommitWithDiffs {
    fn from(commit: Commit) -> Self {
        Self {
            sha: commit.sha,
            message: commit.commit.message,
            author: commit.author.map(|u| u.login).unwrap_or_default(),
            date: commit.commit.author.date,
            files: commit.files.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Status> for StatusCheck {
    fn from(status: Status) -> Self {
        Self {
            context: status.context,
            state: status.state,
            description: status.description,
            target_url: status.target_url,
            created_at: status.created_at,
        }
    }
}

impl From<CombinedStatusResponse> for CombinedStatus {
    fn from(response: CombinedStatusResponse) -> Self {
        Self {
            state: response.state,
            checks: response.statuses.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Annotation> for CheckAnnotation {
    fn from(annotation: Annotation) -> Self {
        Self {
            path: annotation.path,
            start_line: annotation.start_line,
            end_line: annotation.end_line,
            annotation_level: annotation.annotation_level,
            message: annotation.message,
            title: annotation.title,
        }
    }
}

impl CheckRun {
    /// Whether GitHub reports annotations worth fetching for this run
    pub fn has_annotations(&self) -> bool {
        self.output.annotations_count > 0
    }

    pub fn into_summary(self, annotations: Vec<Annotation>) -> CheckRunSummary {
        CheckRunSummary {
            title: self.name,
            status: self.conclusion.unwrap_or(self.status),
            summary: self.output.summary.unwrap_or_default(),
            annotations: annotations.into_iter().map(Into::into).collect(),
            details_url: self.details_url,
        }
    }
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            login: user.login,
            name: user.name,
            avatar_url: user.avatar_url,
        }
    }
}
