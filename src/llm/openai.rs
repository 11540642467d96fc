//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{LlmCallOptions, LlmClient, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI's chat completions API and compatible servers.
///
/// The endpoint is `{base_url}/chat/completions`; `base_url` comes from the
/// call options when set, so one client instance can serve several vendors.
pub struct OpenAiClient {
    client: reqwest::Client,
    default_base_url: String,
}

impl OpenAiClient {
    pub fn new() -> Self {
        OpenAiClient {
            client: reqwest::Client::new(),
            default_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        OpenAiClient {
            client: reqwest::Client::new(),
            default_base_url: base_url.into(),
        }
    }

    fn build_payload(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &LlmCallOptions,
    ) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut payload = json!({
            "model": options.model,
            "messages": messages,
        });
        if let Some(t) = options.temperature {
            payload["temperature"] = json!(t);
        }
        if let Some(m) = options.max_tokens {
            payload["max_tokens"] = json!(m);
        }
        payload
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn send_message(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &LlmCallOptions,
    ) -> Result<String, LlmError> {
        let api_key = options
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingCredentials("api_key not set".to_string()))?;
        let base = options
            .base_url
            .as_deref()
            .unwrap_or(&self.default_base_url)
            .trim_end_matches('/');
        let url = format!("{}/chat/completions", base);
        let payload = self.build_payload(prompt, system_prompt, options);

        tracing::debug!(model = %options.model, url = %url, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                LlmError::Malformed("response has no choices[0].message.content".to_string())
            })
    }
}
