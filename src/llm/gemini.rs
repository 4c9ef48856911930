//! Google Gemini `generateContent` backend.

use super::provider::{LlmError, LlmProvider};
use serde_json::json;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self { client, api_key, model }
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": 0.0},
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Request(e.to_string()) })?;

        if !response.status().is_success() {
            return Err(LlmError::Request(format!("gemini returned status {}", response.status())));
        }

        let parsed: serde_json::Value = response.json().await.map_err(|e| LlmError::Response(e.to_string()))?;
        parsed["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::Response("missing candidates[0].content.parts[0].text".to_string()))
    }
}
