//! OpenAI-compatible API provider.
//!
//! Calls any endpoint implementing the OpenAI chat completions format
//! (OpenAI, Azure-compatible gateways, DeepSeek, Groq, vLLM, ...) via
//! reqwest, with a bounded retry on 429 responses.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::LlmProvider;
use crate::errors::ProviderError;

/// Maximum attempts for a single request (initial try + retries on 429).
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff for rate-limit retries, doubled per attempt.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// An LLM provider that talks to an OpenAI-compatible chat completions
/// endpoint.
pub struct OpenAICompatProvider {
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    client: Client,
}

impl OpenAICompatProvider {
    pub fn new(
        api_key: &str,
        api_base: &str,
        model: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
            client: Client::new(),
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(0);
            return Err(ProviderError::RateLimited {
                status: 429,
                retry_after_ms,
            }
            .into());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthError {
                status: status.as_u16(),
                message,
            }
            .into());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ServerError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::JsonParseError(e.to_string()).into())
    }
}

#[async_trait]
impl LlmProvider for OpenAICompatProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            match self.send_once(&request).await {
                Ok(completion) => {
                    let content = completion
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .filter(|c| !c.is_empty());
                    return content.ok_or_else(|| ProviderError::EmptyResponse.into());
                }
                Err(e) => {
                    let wait_ms = match e.downcast_ref::<ProviderError>() {
                        Some(ProviderError::RateLimited { retry_after_ms, .. }) => {
                            Some(if *retry_after_ms > 0 {
                                *retry_after_ms
                            } else {
                                backoff_ms
                            })
                        }
                        _ => None,
                    };
                    match wait_ms {
                        Some(ms) if attempt + 1 < MAX_ATTEMPTS => {
                            warn!("Rate limited, retrying in {}ms", ms);
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                            backoff_ms *= 2;
                            last_err = Some(e);
                        }
                        _ => return Err(e),
                    }
                }
            }
        }

        debug!("All {} attempts exhausted", MAX_ATTEMPTS);
        Err(last_err.unwrap_or_else(|| ProviderError::EmptyResponse.into()))
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}
