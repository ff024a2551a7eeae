//! Session-authenticated GitHub operations
//!
//! Every operation resolves the session's token first and parses the
//! repository URL second, so an unknown session always fails with
//! `Unauthenticated` regardless of the other arguments.

use futures::stream::{self, StreamExt, TryStreamExt};
use prpilot_core::{
    AccessToken, AuthenticatedUser, ChangedFile, CheckRunSummary, CombinedStatus,
    CommitWithDiffs, PullRequestSummary, RepositoryRef, Result, SessionId, SessionStore,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::GitHubClient;

/// Review event submitted on approval
pub const APPROVE_EVENT: &str = "APPROVE";

/// Body attached to every approval
pub const APPROVAL_MESSAGE: &str = "Approved by AI Review Agent and user.";

/// Per-item detail requests kept in flight at once by a single operation
pub const MAX_CONCURRENT_REQUESTS: usize = 4;

#[derive(Clone)]
pub struct GitHubProxy {
    sessions: Arc<dyn SessionStore>,
    client: GitHubClient,
}

impl GitHubProxy {
    pub fn new(sessions: Arc<dyn SessionStore>, client: GitHubClient) -> Self {
        Self { sessions, client }
    }

    async fn authorize(
        &self,
        session: &SessionId,
        repo_url: &str,
    ) -> Result<(AccessToken, RepositoryRef)> {
        let token = self.sessions.get(session).await?;
        let repo = RepositoryRef::parse(repo_url)?;
        Ok((token, repo))
    }

    /// Open PRs in GitHub's order, each with its commit count
    pub async fn list_open_pull_requests(
        &self,
        session: &SessionId,
        repo_url: &str,
    ) -> Result<Vec<PullRequestSummary>> {
        let (token, repo) = self.authorize(session, repo_url).await?;
        let github = self.client.repo(&token, &repo);

        let pulls = github.list_open_pulls().await?;
        debug!(repo = %repo, count = pulls.len(), "Listed open pull requests");

        // The list endpoint omits `commits`; the single-PR endpoint has it.
        let github = &github;
        stream::iter(pulls.iter().map(|pr| pr.number).collect::<Vec<u64>>())
            .map(|number| github.get_pull(number))
            .buffered(MAX_CONCURRENT_REQUESTS)
            .map_ok(PullRequestSummary::from)
            .try_collect()
            .await
    }

    /// Every commit of the PR with the patches of all files it touched
    pub async fn get_commits_with_diffs(
        &self,
        session: &SessionId,
        repo_url: &str,
        pr_number: u64,
    ) -> Result<Vec<CommitWithDiffs>> {
        let (token, repo) = self.authorize(session, repo_url).await?;
        let github = self.client.repo(&token, &repo);

        let commits = github.list_pull_commits(pr_number).await?;
        let github = &github;
        stream::iter(commits.into_iter().map(|c| c.sha))
            .map(|sha| async move { github.get_commit(&sha).await })
            .buffered(MAX_CONCURRENT_REQUESTS)
            .map_ok(CommitWithDiffs::from)
            .try_collect()
            .await
    }

    /// Combined commit status of the PR's head commit
    pub async fn get_combined_status(
        &self,
        session: &SessionId,
        repo_url: &str,
        pr_number: u64,
    ) -> Result<CombinedStatus> {
        let (token, repo) = self.authorize(session, repo_url).await?;
        let github = self.client.repo(&token, &repo);

        let pr = github.get_pull(pr_number).await?;
        let status = github.get_combined_status(&pr.head.sha).await?;

        Ok(status.into())
    }

    /// Check runs of the PR's head commit with the first page of annotations
    pub async fn get_check_run_summaries(
        &self,
        session: &SessionId,
        repo_url: &str,
        pr_number: u64,
    ) -> Result<Vec<CheckRunSummary>> {
        let (token, repo) = self.authorize(session, repo_url).await?;
        let github = self.client.repo(&token, &repo);

        let pr = github.get_pull(pr_number).await?;
        let runs = github.list_check_runs(&pr.head.sha).await?;

        let mut summaries = Vec::with_capacity(runs.len());
        for run in runs {
            let annotations = if run.has_annotations() {
                github.list_check_run_annotations(run.id).await?
            } else {
                Vec::new()
            };
            summaries.push(run.into_summary(annotations));
        }

        Ok(summaries)
    }

    /// Files changed by the PR as a whole
    pub async fn list_changed_files(
        &self,
        session: &SessionId,
        repo_url: &str,
        pr_number: u64,
    ) -> Result<Vec<ChangedFile>> {
        let (token, repo) = self.authorize(session, repo_url).await?;
        let files = self.client.repo(&token, &repo).list_pull_files(pr_number).await?;

        Ok(files.into_iter().map(Into::into).collect())
    }

    /// Submit an approving review. GitHub decides whether repeats are allowed.
    pub async fn submit_approval(
        &self,
        session: &SessionId,
        repo_url: &str,
        pr_number: u64,
    ) -> Result<()> {
        let (token, repo) = self.authorize(session, repo_url).await?;

        let review = self
            .client
            .repo(&token, &repo)
            .create_review(pr_number, APPROVE_EVENT, APPROVAL_MESSAGE)
            .await?;

        info!(repo = %repo, pr_number, review_id = review.id, "Pull request approved");
        Ok(())
    }

    pub async fn get_authenticated_user(&self, session: &SessionId) -> Result<AuthenticatedUser> {
        let token = self.sessions.get(session).await?;
        Ok(self.client.get_user(&token).await?.into())
    }
}
