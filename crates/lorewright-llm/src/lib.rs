//! Generation service for lorewright
//!
//! Backends implement [`LlmBackend`] and perform single requests. The
//! [`GenerationService`] wraps one backend with pacing, rate-limit backoff,
//! an attempt budget and usage accounting. It is constructed once by the
//! caller and passed by reference to everything that needs it.

mod gemini_backend;
mod generation_service;
pub(crate) mod http_client;
mod types;
mod usage_log;

pub use gemini_backend::GeminiBackend;
pub use generation_service::{
    CallFailure, GenerationService, OUTPUT_TOKENS_PER_WORD, RetryPolicy, UsageStats,
    estimate_output_tokens, is_rate_limit,
};
pub use lorewright_utils::error::LlmError;
pub use types::{GenerationConfig, LlmBackend, LlmInvocation, LlmResult};
pub use usage_log::{DEFAULT_BACKUPS, DEFAULT_MAX_BYTES, UsageLog, UsageOutcome, UsageRecord};

use lorewright_config::Config;
use std::time::Duration;
use tracing::debug;

/// Build the production service: Gemini backend, configured retry policy and
/// usage log.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` when the API key is missing or the HTTP
/// client cannot be built.
pub fn from_config(config: &Config) -> Result<GenerationService, LlmError> {
    let backend = GeminiBackend::new_from_config(config)?;
    let usage_log = match &config.paths.usage_log {
        Some(path) => UsageLog::with_file(path),
        None => UsageLog::in_memory(),
    };

    debug!(
        model = %config.generation.model,
        max_attempts = config.retry.max_attempts,
        usage_log = ?config.paths.usage_log,
        "Building generation service"
    );

    Ok(GenerationService::new(
        Box::new(backend),
        RetryPolicy::from_settings(&config.retry),
    )
    .with_model(
        config.generation.model.clone(),
        Duration::from_secs(config.generation.timeout_secs),
    )
    .with_usage_log(usage_log))
}
