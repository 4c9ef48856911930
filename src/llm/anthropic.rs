//! Anthropic Messages API backend.

use super::provider::{LlmError, LlmProvider};
use serde_json::json;

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self { client, api_key, model }
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 64,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Request(e.to_string()) })?;

        if !response.status().is_success() {
            return Err(LlmError::Request(format!("anthropic returned status {}", response.status())));
        }

        let parsed: serde_json::Value = response.json().await.map_err(|e| LlmError::Response(e.to_string()))?;
        parsed["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::Response("missing content[0].text".to_string()))
    }
}
