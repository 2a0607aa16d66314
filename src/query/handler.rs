//! Query handler capability.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::query::session::SessionState;

/// A domain that can claim and answer natural-language questions.
///
/// Handlers are matched by their pattern set in registration order;
/// `handle` may still decline by returning `Ok(None)`, in which case
/// routing falls through to the next candidate.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Unique registry key for this handler.
    fn name(&self) -> &str;

    /// One-line description shown in category listings.
    fn description(&self) -> &str;

    /// Compiled patterns that claim questions for this handler.
    fn patterns(&self) -> &[Regex];

    /// Answer the question, or decline with `Ok(None)`.
    async fn handle(&self, question: &str, session: &mut SessionState) -> Result<Option<String>>;

    /// Whether any pattern matches the question.
    fn claims(&self, question: &str) -> bool {
        self.patterns().iter().any(|p| p.is_match(question))
    }
}
