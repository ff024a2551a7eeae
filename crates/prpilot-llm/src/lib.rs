//! Prpilot LLM - AI code review
//!
//! This crate provides:
//! - Chat completion client for OpenAI-compatible APIs
//! - Review prompt construction
//! - Pull request review requests

pub mod client;
pub mod review;

pub use client::{ChatCompletionClient, ChatCompletionConfig, CompletionProvider};
pub use review::{build_review_prompt, ReviewRequester, REVIEW_INSTRUCTION};
