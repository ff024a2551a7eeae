//! Integration tests for prpilot
//!
//! These tests drive the router built from an `AppConfig` end to end, with
//! GitHub and the completion API replaced by mock servers.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use prpilot_core::{config, AppConfig, Error};
use prpilot_web::{create_router, AppState};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO_URL: &str = "https://github.com/acme/widget";

// ==================== Test Helpers ====================

async fn body_to_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn test_config(github: &MockServer, completions: &MockServer) -> AppConfig {
    AppConfig {
        github_client_id: "client-123".to_string(),
        github_client_secret: SecretString::new("shh".to_string()),
        oauth_callback_url: "http://localhost:8000/auth/github/callback".to_string(),
        github_oauth_url: github.uri(),
        github_api_url: github.uri(),
        completion_api_key: SecretString::new("gsk_test".to_string()),
        completion_url: format!("{}/openai/v1", completions.uri()),
        completion_model: config::DEFAULT_COMPLETION_MODEL.to_string(),
        frontend_url: None,
    }
}

fn setup_app(config: &AppConfig) -> Router {
    let state = AppState::from_config(config).unwrap();
    create_router(Arc::new(state))
}

async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn login(router: &Router, github: &MockServer, code: &str) -> String {
    let (status, body) = send(router, Method::GET, "/login/github").await;
    assert_eq!(status, StatusCode::OK);
    let state = body["state"].as_str().unwrap().to_string();
    assert!(body["auth_url"]
        .as_str()
        .unwrap()
        .starts_with(&format!("{}/login/oauth/authorize?", github.uri())));

    let (status, body) = send(
        router,
        Method::GET,
        &format!("/auth/github/callback?code={}&state={}", code, state),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "authenticated");

    state
}

async fn mount_token_endpoint(github: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_string_contains("code=valid-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_session_token",
            "token_type": "bearer",
            "scope": "repo"
        })))
        .mount(github)
        .await;
}

fn pull_json(number: u64, commits: Option<u64>) -> Value {
    let mut pr = json!({
        "number": number,
        "title": format!("Change #{}", number),
        "user": { "login": "alice" },
        "body": null,
        "html_url": format!("https://github.com/acme/widget/pull/{}", number),
        "head": { "sha": format!("head{}", number) }
    });
    if let Some(commits) = commits {
        pr["commits"] = json!(commits);
    }
    pr
}

// ==================== End-to-end Tests ====================

#[tokio::test]
async fn test_login_then_list_pull_requests() {
    let github = MockServer::start().await;
    let completions = MockServer::start().await;
    mount_token_endpoint(&github).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls"))
        .and(header("authorization", "Bearer gho_session_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([pull_json(12, None), pull_json(11, None)])),
        )
        .mount(&github)
        .await;
    for (number, commits) in [(12, 1), (11, 4)] {
        Mock::given(method("GET"))
            .and(path(format!("/repos/acme/widget/pulls/{}", number)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(pull_json(number, Some(commits))),
            )
            .mount(&github)
            .await;
    }

    let router = setup_app(&test_config(&github, &completions));
    let state = login(&router, &github, "valid-code").await;

    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/api/list-prs?repo_url={}&state={}", REPO_URL, state),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let prs = body["prs"].as_array().unwrap();
    assert_eq!(prs.len(), 2);
    assert_eq!(prs[0]["number"], 12);
    assert_eq!(prs[0]["commit_count"], 1);
    assert_eq!(prs[1]["number"], 11);
    assert_eq!(prs[1]["commit_count"], 4);
}

#[tokio::test]
async fn test_review_then_approve() {
    let github = MockServer::start().await;
    let completions = MockServer::start().await;
    mount_token_endpoint(&github).await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls/12/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "src/lib.rs", "patch": "@@ -1 +1 @@\n-unsafe { x }\n+x" }
        ])))
        .mount(&github)
        .await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "llama3-70b-8192" })))
        .and(body_string_contains("# File: src/lib.rs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "- Removing `unsafe` is good.\n" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&completions)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/pulls/12/reviews"))
        .and(body_partial_json(json!({ "event": "APPROVE" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "state": "APPROVED" })),
        )
        .expect(2)
        .mount(&github)
        .await;

    let router = setup_app(&test_config(&github, &completions));
    let state = login(&router, &github, "valid-code").await;

    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/api/review-pr?repo_url={}&pr_number=12&state={}", REPO_URL, state),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"], "- Removing `unsafe` is good.");

    // Approving an already-approved PR is accepted again
    for _ in 0..2 {
        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/api/approve-pr?repo_url={}&pr_number=12&state={}", REPO_URL, state),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");
    }
}

#[tokio::test]
async fn test_failed_callback_leaves_session_unauthenticated() {
    let github = MockServer::start().await;
    let completions = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })))
        .mount(&github)
        .await;

    let router = setup_app(&test_config(&github, &completions));

    let (_, body) = send(&router, Method::GET, "/login/github").await;
    let state = body["state"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/auth/github/callback?code=stale&state={}", state),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "oauth_exchange_failed");

    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/api/github-user?state={}", state),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not logged in or token expired");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let github = MockServer::start().await;
    let completions = MockServer::start().await;
    mount_token_endpoint(&github).await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "alice",
            "name": "Alice",
            "avatar_url": "https://avatars.githubusercontent.com/u/1"
        })))
        .mount(&github)
        .await;

    let router = setup_app(&test_config(&github, &completions));
    let state = login(&router, &github, "valid-code").await;

    let (status, body) = send(&router, Method::GET, &format!("/api/github-user?state={}", state)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "alice");

    // A login that never completed cannot borrow the other session's token
    let (_, pending) = send(&router, Method::GET, "/login/github").await;
    let (status, _) = send(
        &router,
        Method::GET,
        &format!("/api/github-user?state={}", pending["state"].as_str().unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let github = MockServer::start().await;
    let completions = MockServer::start().await;

    let config = AppConfig {
        github_client_id: String::new(),
        ..test_config(&github, &completions)
    };

    let err = AppState::from_config(&config).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}
