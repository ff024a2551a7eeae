//! AI review of a pull request diff

use prpilot_core::{ChangedFile, Result, SessionId};
use prpilot_github::GitHubProxy;
use std::sync::Arc;
use tracing::info;

use crate::client::CompletionProvider;

/// Instruction placed ahead of the diff in every review prompt
pub const REVIEW_INSTRUCTION: &str = "You are a senior software engineer. Review the following GitHub pull request diff for code quality, bugs, and improvement suggestions. Reply in concise bullet points.";

/// Build the single-turn review prompt
///
/// Files without a patch are left out; an empty file set still yields the
/// instruction on its own.
pub fn build_review_prompt(files: &[ChangedFile]) -> String {
    let diff: String = files
        .iter()
        .filter_map(|file| {
            file.patch
                .as_deref()
                .filter(|patch| !patch.is_empty())
                .map(|patch| format!("\n# File: {}\n{}\n", file.filename, patch))
        })
        .collect();

    format!("{}\n{}\n", REVIEW_INSTRUCTION, diff)
}

/// Collects a PR's diff and asks the completion provider to review it
#[derive(Clone)]
pub struct ReviewRequester {
    github: GitHubProxy,
    completions: Arc<dyn CompletionProvider>,
}

impl ReviewRequester {
    pub fn new(github: GitHubProxy, completions: Arc<dyn CompletionProvider>) -> Self {
        Self {
            github,
            completions,
        }
    }

    /// One completion call over the whole PR diff; returns the trimmed text
    pub async fn request_review(
        &self,
        session: &SessionId,
        repo_url: &str,
        pr_number: u64,
    ) -> Result<String> {
        let files = self
            .github
            .list_changed_files(session, repo_url, pr_number)
            .await?;

        let prompt = build_review_prompt(&files);
        info!(
            pr_number,
            files = files.len(),
            prompt_len = prompt.len(),
            "Requesting AI review"
        );

        let review = self.completions.complete(&prompt).await?;
        Ok(review.trim().to_string())
    }
}
