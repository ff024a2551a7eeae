//! Chat completion API client
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol (Groq by default).
//! Uses the secrecy crate to protect API keys in memory.

use async_trait::async_trait;
use prpilot_core::{config, Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests; model latency can approach a minute
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default cap on generated tokens
const DEFAULT_MAX_TOKENS: u32 = 512;

/// Anything that turns a single-turn prompt into generated text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat completion client
#[derive(Clone)]
pub struct ChatCompletionClient {
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ChatCompletionClient {
    /// Create a new client with default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, ChatCompletionConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(api_key: impl Into<String>, config: ChatCompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::new(api_key.into()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Send one chat completion request
    pub async fn create_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        debug!(model = %request.model, max_tokens = request.max_tokens, "Requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::UpstreamProvider(format!("Completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.map_err(|e| {
                Error::UpstreamProvider(format!("Completion request failed: {}", e))
            })?;
            return Err(Error::UpstreamProvider(format!(
                "Completion API error ({}): {}",
                status, error
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamProvider(format!("Completion request failed: {}", e)))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: self.max_tokens,
        };

        let response = self.create_completion(&request).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::UpstreamProvider("Completion response had no choices".to_string()))
    }
}

/// Configuration for the chat completion client
#[derive(Debug, Clone)]
pub struct ChatCompletionConfig {
    /// Base URL for the API, without the `/chat/completions` suffix
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ChatCompletionConfig {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_COMPLETION_URL.to_string(),
            model: config::DEFAULT_COMPLETION_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}
