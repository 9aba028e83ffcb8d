//! Core types for the generation backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LlmError;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

impl GenerationConfig {
    /// Sampling parameters from the resolved `[generation]` settings.
    #[must_use]
    pub fn from_settings(settings: &lorewright_config::GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

/// Input to a backend invocation
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Component issuing the call (e.g. `era_architect`); used for usage logging
    pub caller: String,
    /// Model to use; empty means the backend default
    pub model: String,
    /// Timeout for this invocation
    pub timeout: Duration,
    /// Single-turn prompt text
    pub prompt: String,
    pub config: GenerationConfig,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        caller: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        prompt: impl Into<String>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            caller: caller.into(),
            model: model.into(),
            timeout,
            prompt: prompt.into(),
            config,
        }
    }
}

/// Result from a backend invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Raw response text
    pub raw_response: String,
    /// Provider name (e.g. "gemini")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    /// Input tokens reported by the provider (if available)
    pub tokens_input: Option<u64>,
    /// Output tokens reported by the provider (if available)
    pub tokens_output: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// Trait for generation backends.
///
/// A backend performs exactly one request per `invoke`; pacing, retries and
/// usage accounting live in [`crate::GenerationService`].
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the model once.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider errors (auth,
    /// quota, outage) and timeouts.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;

    /// Best-effort token count for `text`.
    ///
    /// # Errors
    ///
    /// Backends without a tokenizer endpoint return `LlmError::Unsupported`.
    async fn count_tokens(&self, _text: &str) -> Result<u64, LlmError> {
        Err(LlmError::Unsupported(
            "token counting not available for this backend".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LlmBackend for Echo {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new(inv.prompt, "echo", inv.model))
        }
    }

    #[tokio::test]
    async fn test_default_count_tokens_is_unsupported() {
        let err = Echo.count_tokens("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Unsupported(_)));
    }

    #[test]
    fn test_generation_config_from_settings() {
        let settings = lorewright_config::GenerationSettings {
            temperature: 0.5,
            ..Default::default()
        };
        let config = GenerationConfig::from_settings(&settings);
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.top_p, 0.95);
        assert_eq!(config.max_output_tokens, 8192);
    }
}
