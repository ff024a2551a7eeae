//! Error types for prpilot-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("User not logged in or token expired")]
    Unauthenticated,

    #[error("GitHub OAuth failed: {0}")]
    OAuthExchangeFailed(String),

    #[error("Invalid repository reference: {0:?}")]
    InvalidRepositoryReference(String),

    #[error("{0}")]
    UpstreamProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Unexpected(String),
}

impl Error {
    /// Stable machine-readable name of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated => "unauthenticated",
            Error::OAuthExchangeFailed(_) => "oauth_exchange_failed",
            Error::InvalidRepositoryReference(_) => "invalid_repository_reference",
            Error::UpstreamProvider(_) => "upstream_provider_error",
            Error::Config(_) => "config_error",
            Error::Unexpected(_) => "unexpected_error",
        }
    }

    /// Whether the caller must (re-)authenticate before retrying
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Unauthenticated | Error::OAuthExchangeFailed(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::UpstreamProvider(format!("Malformed response: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
