//! OpenAI chat-completions backend.

use super::provider::{LlmError, LlmProvider};
use serde_json::json;

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self { client, api_key, model }
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.0,
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Request(e.to_string()) })?;

        if !response.status().is_success() {
            return Err(LlmError::Request(format!("openai returned status {}", response.status())));
        }

        let parsed: serde_json::Value = response.json().await.map_err(|e| LlmError::Response(e.to_string()))?;
        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::Response("missing choices[0].message.content".to_string()))
    }
}
