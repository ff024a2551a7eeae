//! REST API endpoints
//!
//! Every data endpoint takes the session id as the `state` query parameter.
//! Errors from the lower layers are converted into [`ApiError`] in one place
//! and mapped to a status code in one place.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use prpilot_core::{
    AppConfig, AuthenticatedUser, CheckRunSummary, CombinedStatus, CommitWithDiffs,
    InMemorySessionStore, PullRequestSummary, SessionId, SessionStore,
};
use prpilot_github::{
    GitHubClient, GitHubClientConfig, GitHubOAuthConfig, GitHubProxy, LoginStart, OAuthBroker,
};
use prpilot_llm::{ChatCompletionClient, ChatCompletionConfig, ReviewRequester};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};
use url::Url;

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "unauthenticated" | "oauth_exchange_failed" => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<prpilot_core::Error> for ApiError {
    fn from(err: prpilot_core::Error) -> Self {
        if err.is_auth_failure() {
            warn!(code = err.code(), error = %err, "Request rejected");
        } else {
            error!(code = err.code(), error = %err, "Request failed");
        }

        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub oauth: OAuthBroker,
    pub github: GitHubProxy,
    pub reviewer: ReviewRequester,
    /// Browser destination after login; `None` answers the callback with JSON
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(
        oauth: OAuthBroker,
        github: GitHubProxy,
        reviewer: ReviewRequester,
        frontend_url: Option<String>,
    ) -> Self {
        Self {
            oauth,
            github,
            reviewer,
            frontend_url,
        }
    }

    /// Wire every component around one in-memory session store
    pub fn from_config(config: &AppConfig) -> prpilot_core::Result<Self> {
        config.validate()?;

        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

        let oauth = OAuthBroker::new(
            GitHubOAuthConfig::new(
                config.github_client_id.clone(),
                config.github_client_secret.clone(),
                config.oauth_callback_url.clone(),
            )
            .with_host(&config.github_oauth_url),
            sessions.clone(),
        )?;

        let client = GitHubClient::with_config(GitHubClientConfig {
            api_url: config.github_api_url.clone(),
            ..Default::default()
        })?;
        let github = GitHubProxy::new(sessions, client);

        let completions = ChatCompletionClient::with_config(
            config.completion_api_key.expose_secret().clone(),
            ChatCompletionConfig {
                base_url: config.completion_url.clone(),
                model: config.completion_model.clone(),
                ..Default::default()
            },
        )?;
        let reviewer = ReviewRequester::new(github.clone(), Arc::new(completions));

        Ok(Self::new(oauth, github, reviewer, config.frontend_url.clone()))
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login/github", get(login_github))
        .route("/auth/github/callback", get(github_callback))
        .route("/api/list-prs", get(list_prs))
        .route("/api/pr-commits-with-diffs", get(pr_commits_with_diffs))
        .route("/api/pr-status", get(pr_status))
        .route("/api/pr-check-summaries", get(pr_check_summaries))
        .route("/api/review-pr", get(review_pr))
        .route("/api/approve-pr", post(approve_pr))
        .route("/api/github-user", get(github_user))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ==================== Handlers ====================

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn login_github(State(state): State<Arc<AppState>>) -> ApiResult<Json<LoginStart>> {
    Ok(Json(state.oauth.start_login().await?))
}

async fn github_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    state
        .oauth
        .complete_login(&params.code, params.state.clone())
        .await?;

    match &state.frontend_url {
        Some(frontend) => {
            let target = frontend_redirect(frontend, &params.state)?;
            Ok(Redirect::to(&target).into_response())
        }
        None => Ok(Json(CallbackResponse {
            status: "authenticated".to_string(),
            state: params.state,
        })
        .into_response()),
    }
}

async fn list_prs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RepoParams>,
) -> ApiResult<Json<PrListResponse>> {
    let prs = state
        .github
        .list_open_pull_requests(&params.state, &params.repo_url)
        .await?;
    Ok(Json(PrListResponse { prs }))
}

async fn pr_commits_with_diffs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PrParams>,
) -> ApiResult<Json<CommitsResponse>> {
    let commits = state
        .github
        .get_commits_with_diffs(&params.state, &params.repo_url, params.pr_number)
        .await?;
    Ok(Json(CommitsResponse { commits }))
}

async fn pr_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PrParams>,
) -> ApiResult<Json<CombinedStatus>> {
    let status = state
        .github
        .get_combined_status(&params.state, &params.repo_url, params.pr_number)
        .await?;
    Ok(Json(status))
}

async fn pr_check_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PrParams>,
) -> ApiResult<Json<ChecksResponse>> {
    let checks = state
        .github
        .get_check_run_summaries(&params.state, &params.repo_url, params.pr_number)
        .await?;
    Ok(Json(ChecksResponse { checks }))
}

async fn review_pr(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PrParams>,
) -> ApiResult<Json<ReviewResponse>> {
    let review = state
        .reviewer
        .request_review(&params.state, &params.repo_url, params.pr_number)
        .await?;
    Ok(Json(ReviewResponse { review }))
}

async fn approve_pr(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PrParams>,
) -> ApiResult<Json<ApprovalResponse>> {
    state
        .github
        .submit_approval(&params.state, &params.repo_url, params.pr_number)
        .await?;
    Ok(Json(ApprovalResponse {
        status: "approved".to_string(),
    }))
}

async fn github_user(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionParams>,
) -> ApiResult<Json<AuthenticatedUser>> {
    Ok(Json(state.github.get_authenticated_user(&params.state).await?))
}

/// `{frontend}/?state={state}`, with the state query-encoded
fn frontend_redirect(frontend: &str, state: &SessionId) -> ApiResult<String> {
    let mut url = Url::parse(frontend).map_err(|e| {
        prpilot_core::Error::Config(format!("invalid frontend url {:?}: {}", frontend, e))
    })?;
    url.query_pairs_mut().append_pair("state", state.as_str());
    Ok(url.to_string())
}

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    pub state: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct RepoParams {
    pub repo_url: String,
    pub state: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct PrParams {
    pub repo_url: String,
    pub pr_number: u64,
    pub state: SessionId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub status: String,
    pub state: SessionId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrListResponse {
    pub prs: Vec<PullRequestSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitsResponse {
    pub commits: Vec<CommitWithDiffs>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChecksResponse {
    pub checks: Vec<CheckRunSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub review: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prpilot_core::Error;

    #[test]
    fn test_auth_errors_map_to_401() {
        let response = ApiError::from(Error::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response =
            ApiError::from(Error::OAuthExchangeFailed("bad code".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        for err in [
            Error::InvalidRepositoryReference("acme".into()),
            Error::UpstreamProvider("GitHub API error (404 Not Found): Not Found".into()),
            Error::Unexpected("boom".into()),
        ] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_api_error_carries_message_and_code() {
        let api_error = ApiError::from(Error::InvalidRepositoryReference("acme".into()));
        assert_eq!(api_error.code, "invalid_repository_reference");
        assert!(api_error.error.contains("acme"));
    }

    #[test]
    fn test_frontend_redirect() {
        let target =
            frontend_redirect("http://localhost:8501", &SessionId::from("abc-123")).unwrap();
        assert_eq!(target, "http://localhost:8501/?state=abc-123");

        let target = frontend_redirect("http://ui.example.com/app", &SessionId::from("a b")).unwrap();
        assert_eq!(target, "http://ui.example.com/app?state=a+b");
    }

    #[test]
    fn test_frontend_redirect_rejects_bad_url() {
        assert!(frontend_redirect("not a url", &SessionId::from("x")).is_err());
    }
}
