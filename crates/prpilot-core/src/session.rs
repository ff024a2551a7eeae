//! Login sessions and the store that maps them to GitHub access tokens
//!
//! A session is created when a user starts the GitHub login flow and becomes
//! usable once the OAuth callback has stored a token under its id. Absence of
//! a token means "not logged in"; there is no expiry and no server-side logout.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Opaque session identifier
///
/// The same value serves two purposes: it is sent to GitHub as the OAuth
/// `state` anti-forgery token, and it is the key under which the exchanged
/// access token is stored. Clients pass it back as the `state` query
/// parameter on every API call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unguessable session id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// GitHub access token. Never printed by `Debug`.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    /// Raw token value, for building an `Authorization` header
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Key-value store from session id to access token
///
/// `get` and `put` are the only operations. Implementations must tolerate
/// concurrent calls from independent requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store or overwrite the token for a session
    async fn put(&self, session_id: SessionId, token: AccessToken) -> Result<()>;

    /// Look up the token for a session, failing with `Unauthenticated` when absent
    async fn get(&self, session_id: &SessionId) -> Result<AccessToken>;
}

/// Process-local session store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    tokens: RwLock<HashMap<SessionId, AccessToken>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session_id: SessionId, token: AccessToken) -> Result<()> {
        self.tokens.write().await.insert(session_id, token);
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<AccessToken> {
        self.tokens
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or(Error::Unauthenticated)
    }
}
