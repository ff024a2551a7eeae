//! Prpilot GitHub - GitHub API integration
//!
//! This crate provides GitHub integration:
//! - OAuth login and token exchange
//! - REST client for pull requests, commits and CI checks
//! - Session-authenticated proxy operations

pub mod client;
pub mod oauth;
pub mod proxy;
pub mod types;

pub use client::{GitHubClient, GitHubClientConfig};
pub use oauth::{GitHubOAuthConfig, LoginStart, OAuthBroker};
pub use proxy::GitHubProxy;
