//! The `LlmProvider` trait abstraction (A1). Concrete providers are thin shims over a
//! `reqwest::Client`; retry and fallback policy live in [`super::manager::LlmManager`],
//! not here.

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("LLM returned an unexpected response shape: {0}")]
    Response(String),
    #[error("LLM request timed out")]
    Timeout,
    #[error("no API key configured for provider '{0}'")]
    MissingApiKey(String),
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
