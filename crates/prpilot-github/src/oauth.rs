//! GitHub OAuth login
//!
//! The flow has two halves:
//!
//! 1. [`OAuthBroker::start_login`] generates a [`SessionId`] and the GitHub
//!    authorization URL carrying it as the `state` parameter.
//! 2. GitHub redirects the browser back with `code` and `state`;
//!    [`OAuthBroker::complete_login`] exchanges the code for an access token
//!    and stores it under that session id.
//!
//! Until step 2 succeeds the session is indistinguishable from an unknown one.

use prpilot_core::{AccessToken, Error, Result, SessionId, SessionStore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Scope needed to read private PRs and submit reviews
pub const DEFAULT_SCOPE: &str = "repo";

const TOKEN_EXCHANGE_TIMEOUT_SECS: u64 = 30;

/// OAuth app credentials and endpoints
#[derive(Debug, Clone)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Callback URL registered with the OAuth app
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
}

impl GitHubOAuthConfig {
    /// Config against github.com with the `repo` scope
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
        }
    }

    /// Point both OAuth endpoints at another host, e.g. GitHub Enterprise
    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim_end_matches('/');
        self.authorize_url = format!("{}/login/oauth/authorize", host);
        self.token_url = format!("{}/login/oauth/access_token", host);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::Config("client_id cannot be empty".to_string()));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(Error::Config("client_secret cannot be empty".to_string()));
        }
        if self.redirect_uri.is_empty() {
            return Err(Error::Config("redirect_uri cannot be empty".to_string()));
        }
        Url::parse(&self.authorize_url)
            .map_err(|e| Error::Config(format!("invalid authorize url: {}", e)))?;
        Ok(())
    }

    /// Scopes joined for the authorization URL
    pub fn scopes_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Result of starting a login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStart {
    /// URL the browser must visit to authorize the app
    pub auth_url: String,
    /// Session id, echoed back by GitHub as `state`
    pub state: SessionId,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Issues authorization URLs and turns callback codes into stored tokens
#[derive(Clone)]
pub struct OAuthBroker {
    config: GitHubOAuthConfig,
    http_client: reqwest::Client,
    sessions: Arc<dyn SessionStore>,
}

impl OAuthBroker {
    pub fn new(config: GitHubOAuthConfig, sessions: Arc<dyn SessionStore>) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TOKEN_EXCHANGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            sessions,
        })
    }

    /// Authorization URL carrying `state` as the anti-forgery token
    pub fn authorization_url(&self, state: &SessionId) -> Result<String> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| Error::Config(format!("invalid authorize url: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes_string())
            .append_pair("state", state.as_str());

        Ok(url.to_string())
    }

    /// Begin a login with a session id that is not yet mapped to a token
    pub async fn start_login(&self) -> Result<LoginStart> {
        let state = loop {
            let candidate = SessionId::generate();
            match self.sessions.get(&candidate).await {
                Err(Error::Unauthenticated) => break candidate,
                Ok(_) => continue,
                Err(e) => return Err(e),
            }
        };

        let auth_url = self.authorization_url(&state)?;
        debug!(state = %state, "Login started");

        Ok(LoginStart { auth_url, state })
    }

    /// Exchange the callback `code` and store the token under `state`
    #[tracing::instrument(skip(self, code))]
    pub async fn complete_login(&self, code: &str, state: SessionId) -> Result<()> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", state.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::UpstreamProvider(format!("GitHub token request failed: {}", e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamProvider(format!("GitHub token request failed: {}", e)))?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::OAuthExchangeFailed(format!("unreadable token response: {}", e))
        })?;

        let token = match parsed.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                let reason = parsed
                    .error_description
                    .or(parsed.error)
                    .unwrap_or_else(|| "no access token in response".to_string());
                warn!(reason = %reason, "GitHub rejected the authorization code");
                return Err(Error::OAuthExchangeFailed(reason));
            }
        };

        self.sessions.put(state, AccessToken::new(token)).await?;
        info!("GitHub login completed");
        Ok(())
    }
}
