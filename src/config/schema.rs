//! Configuration schema for termbot.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so that the JSON
//! config file can use camelCase keys while Rust code uses snake_case fields.

use serde::{Deserialize, Serialize};

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// API key. Falls back to the `TERMBOT_LLM_API_KEY` environment
    /// variable when empty.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of an OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Stock data collaborator configuration (Alpha Vantage).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockConfig {
    /// Falls back to the `ALPHA_VANTAGE_API_KEY` environment variable
    /// when empty.
    #[serde(default)]
    pub api_key: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
        }
    }
}

/// Sandbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxConfig {
    /// Root of the simulated filesystem tree. Empty means
    /// `~/.termbot/sandbox`.
    #[serde(default)]
    pub root: String,
    /// Timeout for generated-code execution, in seconds.
    #[serde(default = "default_exec_timeout")]
    pub exec_timeout_secs: u64,
}

fn default_exec_timeout() -> u64 {
    30
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            exec_timeout_secs: default_exec_timeout(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub stock: StockConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

impl Config {
    /// Resolve the LLM API key (config value, else environment).
    pub fn llm_api_key(&self) -> String {
        if !self.llm.api_key.is_empty() {
            return self.llm.api_key.clone();
        }
        std::env::var("TERMBOT_LLM_API_KEY").unwrap_or_default()
    }

    /// Resolve the Alpha Vantage API key (config value, else environment).
    pub fn stock_api_key(&self) -> String {
        if !self.stock.api_key.is_empty() {
            return self.stock.api_key.clone();
        }
        std::env::var("ALPHA_VANTAGE_API_KEY").unwrap_or_default()
    }
}
