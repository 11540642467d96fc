//! The LLM call collaborator.
//!
//! The engine treats a model call as an opaque `prompt -> text` operation
//! behind the [`LlmClient`] trait. [`OpenAiClient`] is the bundled
//! OpenAI-compatible implementation; embedders plug in anything else the
//! same way node executors are plugged in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod openai;

pub use openai::OpenAiClient;

/// Errors surfaced by an LLM provider. The engine wraps them with node
/// context but does not retry.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("LLM response malformed: {0}")]
    Malformed(String),
    #[error("Missing LLM credentials: {0}")]
    MissingCredentials(String),
}

/// Per-call provider options, read from a node's `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmCallOptions {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for LlmCallOptions {
    fn default() -> Self {
        LlmCallOptions {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            temperature: None,
            api_key: None,
            base_url: None,
            max_tokens: None,
        }
    }
}

impl LlmCallOptions {
    /// Extract options from a node's `data` object, tolerating absent or
    /// oddly-typed fields (the editor persists whatever the form held).
    pub fn from_node_data(data: &Value) -> Self {
        let defaults = LlmCallOptions::default();
        let str_field = |key: &str| {
            data.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };
        LlmCallOptions {
            provider: str_field("provider").unwrap_or(defaults.provider),
            model: str_field("model").unwrap_or(defaults.model),
            temperature: data.get("temperature").and_then(|v| v.as_f64()),
            api_key: str_field("api_key"),
            base_url: str_field("base_url"),
            max_tokens: data
                .get("max_tokens")
                .and_then(|v| v.as_u64())
                .map(|n| n as u32),
        }
    }
}

/// Opaque model-call seam: prompt + options in, response text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn send_message(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &LlmCallOptions,
    ) -> Result<String, LlmError>;
}

/// Interpret a model's answer to a "reply exactly true or false" prompt.
///
/// Returns `(value, ambiguous)`. The value is true iff the response
/// case-insensitively contains "true" — the historical heuristic downstream
/// workflows depend on. `ambiguous` flags responses containing both keywords
/// or neither, so callers can log them distinctly.
pub fn parse_bool_response(text: &str) -> (bool, bool) {
    let lower = text.to_lowercase();
    let has_true = lower.contains("true");
    let has_false = lower.contains("false");
    (has_true, has_true == has_false)
}
