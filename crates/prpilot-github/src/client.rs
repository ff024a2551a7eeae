//! GitHub REST API client

use prpilot_core::{AccessToken, Error, RepositoryRef, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::types::{
    Annotation, CheckRun, CheckRunsResponse, CombinedStatusResponse, Commit, CreateReviewRequest,
    DiffEntry, ErrorBody, PullCommit, PullRequest, Review, User,
};

/// Default timeout for API requests
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size used when following paginated list endpoints
const PER_PAGE: usize = 100;

/// Annotations GitHub returns per call at most
pub const ANNOTATIONS_PER_PAGE: usize = 50;

const API_VERSION: &str = "2022-11-28";

/// Configuration for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Base URL for the REST API
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_url: prpilot_core::config::DEFAULT_GITHUB_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: 10,
        }
    }
}

/// Shared GitHub REST client. Every call is authenticated with the token
/// passed in, so one client serves all sessions.
#[derive(Clone)]
pub struct GitHubClient {
    api_url: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for api.github.com
    pub fn new() -> Result<Self> {
        Self::with_config(GitHubClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: GitHubClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("prpilot/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Calls scoped to one repository
    pub fn repo<'a>(&'a self, token: &'a AccessToken, repo: &'a RepositoryRef) -> RepoClient<'a> {
        RepoClient {
            github: self,
            token,
            repo,
        }
    }

    /// Profile of the token owner
    pub async fn get_user(&self, token: &AccessToken) -> Result<User> {
        self.get_json(token, "/user", &[]).await
    }

    fn request(&self, method: Method, token: &AccessToken, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(token.expose())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(path = %path, "GitHub GET");
        let response = self
            .request(Method::GET, token, path)
            .query(query)
            .send()
            .await
            .map_err(request_failed)?;
        read_json(response).await
    }

    /// Follow `page` until GitHub returns a short page
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let mut page_query = query.to_vec();
            page_query.push(("per_page", PER_PAGE.to_string()));
            page_query.push(("page", page.to_string()));

            let batch: Vec<T> = self.get_json(token, path, &page_query).await?;
            let len = batch.len();
            items.extend(batch);

            if len < PER_PAGE {
                return Ok(items);
            }
            page += 1;
        }
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path = %path, "GitHub POST");
        let response = self
            .request(Method::POST, token, path)
            .json(body)
            .send()
            .await
            .map_err(request_failed)?;
        read_json(response).await
    }
}

/// GitHub calls for a single repository
pub struct RepoClient<'a> {
    github: &'a GitHubClient,
    token: &'a AccessToken,
    repo: &'a RepositoryRef,
}

impl RepoClient<'_> {
    fn path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.repo.owner, self.repo.name, suffix)
    }

    /// All open pull requests, in GitHub's default order
    pub async fn list_open_pulls(&self) -> Result<Vec<PullRequest>> {
        self.github
            .get_all_pages(self.token, &self.path("/pulls"), &[("state", "open".to_string())])
            .await
    }

    /// Full pull request, including its commit count and head sha
    pub async fn get_pull(&self, number: u64) -> Result<PullRequest> {
        self.github
            .get_json(self.token, &self.path(&format!("/pulls/{}", number)), &[])
            .await
    }

    pub async fn list_pull_commits(&self, number: u64) -> Result<Vec<PullCommit>> {
        self.github
            .get_all_pages(self.token, &self.path(&format!("/pulls/{}/commits", number)), &[])
            .await
    }

    pub async fn list_pull_files(&self, number: u64) -> Result<Vec<DiffEntry>> {
        self.github
            .get_all_pages(self.token, &self.path(&format!("/pulls/{}/files", number)), &[])
            .await
    }

    /// Commit with its changed files and patches
    pub async fn get_commit(&self, sha: &str) -> Result<Commit> {
        self.github
            .get_json(self.token, &self.path(&format!("/commits/{}", sha)), &[])
            .await
    }

    pub async fn get_combined_status(&self, sha: &str) -> Result<CombinedStatusResponse> {
        self.github
            .get_json(self.token, &self.path(&format!("/commits/{}/status", sha)), &[])
            .await
    }

    /// All check runs of a commit. The endpoint wraps each page in an
    /// object, so it is paged here rather than through `get_all_pages`.
    pub async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        let path = self.path(&format!("/commits/{}/check-runs", sha));
        let mut runs = Vec::new();
        let mut page = 1usize;

        loop {
            let response: CheckRunsResponse = self
                .github
                .get_json(
                    self.token,
                    &path,
                    &[
                        ("per_page", PER_PAGE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let len = response.check_runs.len();
            runs.extend(response.check_runs);

            if len < PER_PAGE {
                return Ok(runs);
            }
            page += 1;
        }
    }

    /// First page of a check run's annotations. Runs with more than
    /// [`ANNOTATIONS_PER_PAGE`] annotations are truncated.
    pub async fn list_check_run_annotations(&self, check_run_id: u64) -> Result<Vec<Annotation>> {
        self.github
            .get_json(
                self.token,
                &self.path(&format!("/check-runs/{}/annotations", check_run_id)),
                &[("per_page", ANNOTATIONS_PER_PAGE.to_string())],
            )
            .await
    }

    pub async fn create_review(&self, number: u64, event: &str, body: &str) -> Result<Review> {
        self.github
            .post_json(
                self.token,
                &self.path(&format!("/pulls/{}/reviews", number)),
                &CreateReviewRequest { event, body },
            )
            .await
    }
}

fn request_failed(err: reqwest::Error) -> Error {
    Error::UpstreamProvider(format!("GitHub request failed: {}", err))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(request_failed)?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        return Err(Error::UpstreamProvider(format!(
            "GitHub API error ({}): {}",
            status, message
        )));
    }

    Ok(serde_json::from_str(&body)?)
}
