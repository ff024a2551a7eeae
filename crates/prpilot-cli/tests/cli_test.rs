//! Integration tests for the prpilot binary's argument handling

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary run from an empty directory with a clean environment, so neither a
/// developer's `.env` nor their shell variables leak into the test
fn prpilot(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("prpilot").unwrap();
    cmd.env_clear().current_dir(dir.path());
    cmd
}

fn credential_args(client_id: &str) -> Vec<String> {
    [
        "--github-client-id",
        client_id,
        "--github-client-secret",
        "shh",
        "--oauth-callback-url",
        "http://localhost:8000/auth/github/callback",
        "--completion-api-key",
        "gsk_test",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    prpilot(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_serve_help_documents_env_fallbacks() {
    let dir = TempDir::new().unwrap();
    prpilot(&dir)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GITHUB_CLIENT_ID"))
        .stdout(predicate::str::contains("GROQ_API_KEY"))
        .stdout(predicate::str::contains("PRPILOT_FRONTEND_URL"));
}

#[test]
fn test_missing_credentials_rejected() {
    let dir = TempDir::new().unwrap();
    prpilot(&dir)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--github-client-id"));
}

#[test]
fn test_check_config_accepts_complete_config() {
    let dir = TempDir::new().unwrap();
    prpilot(&dir)
        .arg("check-config")
        .args(credential_args("client-123"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

#[test]
fn test_check_config_reads_environment() {
    let dir = TempDir::new().unwrap();
    prpilot(&dir)
        .arg("check-config")
        .env("GITHUB_CLIENT_ID", "client-123")
        .env("GITHUB_CLIENT_SECRET", "shh")
        .env("OAUTH_CALLBACK_URL", "http://localhost:8000/auth/github/callback")
        .env("GROQ_API_KEY", "gsk_test")
        .assert()
        .success();
}

#[test]
fn test_check_config_reads_dotenv_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "GITHUB_CLIENT_ID=client-123\n\
         GITHUB_CLIENT_SECRET=shh\n\
         OAUTH_CALLBACK_URL=http://localhost:8000/auth/github/callback\n\
         GROQ_API_KEY=gsk_test\n",
    )
    .unwrap();

    prpilot(&dir).arg("check-config").assert().success();
}

#[test]
fn test_check_config_rejects_blank_client_id() {
    let dir = TempDir::new().unwrap();
    prpilot(&dir)
        .arg("check-config")
        .args(credential_args("  "))
        .assert()
        .failure()
        .stderr(predicate::str::contains("github client id cannot be empty"));
}
