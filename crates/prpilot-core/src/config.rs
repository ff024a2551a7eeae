//! Process configuration

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_OAUTH_URL: &str = "https://github.com";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:8501";

/// Everything the server needs to talk to GitHub and the completion API
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OAuth app client id
    pub github_client_id: String,
    /// OAuth app client secret
    pub github_client_secret: SecretString,
    /// Callback URL registered with the OAuth app
    pub oauth_callback_url: String,
    /// Host serving `/login/oauth/*`
    pub github_oauth_url: String,
    /// GitHub REST API base URL
    pub github_api_url: String,
    /// Completion API key
    pub completion_api_key: SecretString,
    /// Completion API base URL (OpenAI-compatible)
    pub completion_url: String,
    /// Completion model name
    pub completion_model: String,
    /// Where the browser is sent after a successful login.
    /// `None` answers the callback with JSON instead.
    pub frontend_url: Option<String>,
}

impl AppConfig {
    /// Reject empty credentials and endpoints
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("github client id", self.github_client_id.as_str()),
            ("github client secret", self.github_client_secret.expose_secret().as_str()),
            ("oauth callback url", self.oauth_callback_url.as_str()),
            ("github oauth url", self.github_oauth_url.as_str()),
            ("github api url", self.github_api_url.as_str()),
            ("completion api key", self.completion_api_key.expose_secret().as_str()),
            ("completion url", self.completion_url.as_str()),
            ("completion model", self.completion_model.as_str()),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", name)));
            }
        }

        if matches!(self.frontend_url.as_deref(), Some(url) if url.trim().is_empty()) {
            return Err(Error::Config("frontend url cannot be empty".to_string()));
        }

        Ok(())
    }
}
