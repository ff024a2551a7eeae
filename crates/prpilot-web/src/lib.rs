//! Prpilot Web - HTTP interface
//!
//! This crate provides the HTTP surface consumed by the UI:
//! - GitHub login and OAuth callback
//! - Pull request, commit and CI endpoints
//! - AI review and approval endpoints

pub mod api;

pub use api::{create_router, ApiError, AppState};
