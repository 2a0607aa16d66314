//! Base LLM provider interface.

use anyhow::Result;
use async_trait::async_trait;

/// Abstract base trait for LLM providers.
///
/// The terminal needs exactly one capability from a language model: turn a
/// system prompt plus a user prompt into text. Code-generation structure
/// (FILENAME / CODE / EXECUTE) is parsed by the caller, not the provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a completion request and return the response text.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}
