//! Resolves a provider name to a constructed [`LlmProvider`] and applies the shared
//! timeout/retry/fallback policy from the corpus's `PROVIDER_CONFIGS` dispatch table
//! uniformly across providers.

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::{LlmError, LlmProvider};
use crate::config::{api_key_env_var, default_model_for, LlmConfig};
use std::sync::Arc;
use std::time::Duration;

pub struct LlmManager {
    provider: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl LlmManager {
    /// Builds a manager around the named provider, reading its API key from the
    /// environment. Returns `Err` only when the provider name is unknown or the key is
    /// missing; all further failures surface through [`Self::generate`] as a fallback.
    pub fn from_provider_name(provider_name: &str, config: LlmConfig) -> Result<Self, LlmError> {
        let env_var = api_key_env_var(provider_name).ok_or_else(|| LlmError::MissingApiKey(provider_name.to_string()))?;
        let api_key = std::env::var(env_var).map_err(|_| LlmError::MissingApiKey(provider_name.to_string()))?;
        let model = default_model_for(provider_name).to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client builder should not fail with no custom TLS config");

        let provider: Arc<dyn LlmProvider> = match provider_name {
            "openai" => Arc::new(OpenAiProvider::new(client, api_key, model)),
            "gemini" => Arc::new(GeminiProvider::new(client, api_key, model)),
            "anthropic" => Arc::new(AnthropicProvider::new(client, api_key, model)),
            other => return Err(LlmError::MissingApiKey(other.to_string())),
        };

        Ok(Self { provider, config })
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>, config: LlmConfig) -> Self {
        Self { provider, config }
    }

    /// Calls the provider with a per-call timeout, retrying transient failures up to
    /// `max_retries` times with a fixed delay. After exhaustion, returns the configured
    /// fallback text rather than propagating the error, so the pipeline can continue.
    pub async fn generate(&self, prompt: &str) -> String {
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            let call = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), self.provider.generate(prompt));
            match call.await {
                Ok(Ok(text)) if !text.trim().is_empty() => return text,
                Ok(Ok(_)) => last_err = Some(LlmError::Response("empty completion".to_string())),
                Ok(Err(e)) => last_err = Some(e),
                Err(_) => last_err = Some(LlmError::Timeout),
            }
            if attempt < self.config.max_retries {
                tokio::time::sleep(Duration::from_secs_f64(self.config.retry_delay_secs)).await;
            }
        }
        tracing::warn!(provider = self.provider.name(), error = ?last_err, "LLM call exhausted retries, using fallback text");
        self.config.fallback_text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyProvider {
        calls: AtomicUsize,
        succeed_on: usize,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FlakyProvider {
        fn name(&self) -> &'static str {
            "flaky"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n + 1 >= self.succeed_on {
                Ok("2".to_string())
            } else {
                Err(LlmError::Request("simulated failure".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let provider = Arc::new(FlakyProvider { calls: AtomicUsize::new(0), succeed_on: 2 });
        let cfg = LlmConfig { timeout_secs: 5, max_retries: 3, retry_delay_secs: 0.01, fallback_text: "fallback".into() };
        let manager = LlmManager::with_provider(provider, cfg);
        assert_eq!(manager.generate("prompt").await, "2");
    }

    #[tokio::test]
    async fn falls_back_to_configured_text_after_exhausting_retries() {
        let provider = Arc::new(FlakyProvider { calls: AtomicUsize::new(0), succeed_on: 100 });
        let cfg = LlmConfig { timeout_secs: 5, max_retries: 2, retry_delay_secs: 0.01, fallback_text: "本日の天気情報です".into() };
        let manager = LlmManager::with_provider(provider, cfg);
        assert_eq!(manager.generate("prompt").await, "本日の天気情報です");
    }
}
