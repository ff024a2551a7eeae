//! Prpilot Core - Core types shared by the server crates
//!
//! This crate provides:
//! - Session ids, access tokens and the session store
//! - Repository reference parsing
//! - Pull request, commit and CI projections
//! - Error taxonomy
//! - Process configuration

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod session;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use models::{
    AuthenticatedUser, ChangedFile, CheckAnnotation, CheckRunSummary, CombinedStatus,
    CommitState, CommitWithDiffs, FileDiff, PullRequestSummary, StatusCheck,
    NO_PATCH_PLACEHOLDER,
};
pub use repository::RepositoryRef;
pub use session::{AccessToken, InMemorySessionStore, SessionId, SessionStore};
