//! Rate-limited, attempt-bounded wrapper around a generation backend.
//!
//! [`GenerationService::call`] is the only way the pipeline talks to a model:
//!
//! 1. Sleep until `min_call_interval` has passed since the previous attempt.
//! 2. Ask the backend for a best-effort input token count.
//! 3. Invoke the backend up to `max_attempts` times. Rate-limit failures back
//!    off exponentially (`base * 2^attempt`, capped); other failures pause for
//!    `retry_delay`. Nothing waits after the final attempt.
//! 4. Return the text, or a [`CallFailure`] value once the budget is spent.
//!
//! Every attempt is appended to the [`UsageLog`].

use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use lorewright_config::RetrySettings;

use crate::LlmError;
use crate::types::{GenerationConfig, LlmBackend, LlmInvocation};
use crate::usage_log::{UsageLog, UsageOutcome, UsageRecord};

/// Output tokens are estimated as whitespace-delimited words times this factor
pub const OUTPUT_TOKENS_PER_WORD: f64 = 1.3;

/// Pacing and retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_call_interval: Duration,
    pub rate_limit_base: Duration,
    pub rate_limit_max: Duration,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            min_call_interval: Duration::from_secs_f64(settings.min_call_interval_secs.max(0.0)),
            rate_limit_base: Duration::from_secs(settings.rate_limit_base_secs),
            rate_limit_max: Duration::from_secs(settings.rate_limit_max_secs),
            retry_delay: Duration::from_secs_f64(settings.retry_delay_secs.max(0.0)),
        }
    }

    /// Backoff after the rate-limited attempt with 0-based index `attempt`.
    #[must_use]
    pub fn rate_limit_wait(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.rate_limit_base
            .checked_mul(factor)
            .unwrap_or(self.rate_limit_max)
            .min(self.rate_limit_max)
    }
}

/// A call that exhausted its attempt budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generation failed after {attempts} attempt(s): {last_error}")]
pub struct CallFailure {
    pub attempts: u32,
    /// Rate-limit backoffs taken between attempts, in order
    pub waits: Vec<Duration>,
    pub last_error: String,
}

/// Cumulative usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub estimated_total_tokens: u64,
}

/// Whether an error should be treated as a provider rate limit.
#[must_use]
pub fn is_rate_limit(error: &LlmError) -> bool {
    if matches!(error, LlmError::ProviderQuota(_)) {
        return true;
    }
    let text = error.to_string();
    text.contains("429") || text.to_ascii_lowercase().contains("quota")
}

/// `floor(words * 1.3)`
#[must_use]
pub fn estimate_output_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count();
    (words as f64 * OUTPUT_TOKENS_PER_WORD).floor() as u64
}

/// Caller-owned generation service; one per process, passed by reference.
pub struct GenerationService {
    backend: Box<dyn LlmBackend>,
    policy: RetryPolicy,
    model: String,
    timeout: Duration,
    /// Start of the most recent attempt; the lock is never held across an await
    last_call: Mutex<Option<Instant>>,
    total_requests: AtomicU64,
    total_input_tokens: AtomicU64,
    total_output_tokens: AtomicU64,
    usage_log: UsageLog,
}

impl GenerationService {
    #[must_use]
    pub fn new(backend: Box<dyn LlmBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            model: String::new(),
            timeout: Duration::from_secs(120),
            last_call: Mutex::new(None),
            total_requests: AtomicU64::new(0),
            total_input_tokens: AtomicU64::new(0),
            total_output_tokens: AtomicU64::new(0),
            usage_log: UsageLog::in_memory(),
        }
    }

    /// Model name and per-request timeout passed to the backend.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>, timeout: Duration) -> Self {
        self.model = model.into();
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_usage_log(mut self, usage_log: UsageLog) -> Self {
        self.usage_log = usage_log;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn usage_log(&self) -> &UsageLog {
        &self.usage_log
    }

    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`CallFailure`] once `max_attempts` attempts have failed.
    pub async fn call(
        &self,
        caller: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, CallFailure> {
        self.pace().await;

        let input_tokens = match self.backend.count_tokens(prompt).await {
            Ok(count) => Some(count),
            Err(e) => {
                debug!(caller, error = %e, "Token count unavailable");
                None
            }
        };

        let max_attempts = self.policy.max_attempts;
        let mut waits = Vec::new();
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            let is_final = attempt + 1 == max_attempts;
            self.mark_attempt();
            let started = Instant::now();

            let invocation =
                LlmInvocation::new(caller, self.model.as_str(), self.timeout, prompt, *config);

            match self.backend.invoke(invocation).await {
                Ok(result) => {
                    let output_tokens = estimate_output_tokens(&result.raw_response);
                    let total = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;
                    self.total_input_tokens
                        .fetch_add(input_tokens.unwrap_or(0), Ordering::Relaxed);
                    self.total_output_tokens
                        .fetch_add(output_tokens, Ordering::Relaxed);

                    self.usage_log.append(UsageRecord::new(
                        caller,
                        UsageOutcome::Success {
                            input_tokens,
                            output_tokens,
                            latency: started.elapsed(),
                            total_requests: total,
                        },
                    ));
                    return Ok(result.raw_response);
                }
                Err(e) => {
                    last_error = e.to_string();
                    self.usage_log.append(UsageRecord::new(
                        caller,
                        UsageOutcome::Error {
                            attempt: attempt + 1,
                            max_attempts,
                            latency: started.elapsed(),
                            error: last_error.clone(),
                        },
                    ));

                    if is_final {
                        break;
                    }

                    if is_rate_limit(&e) {
                        let wait = self.policy.rate_limit_wait(attempt);
                        warn!(
                            caller,
                            attempt = attempt + 1,
                            wait_secs = wait.as_secs(),
                            "Rate limited, backing off"
                        );
                        self.usage_log
                            .append(UsageRecord::new(caller, UsageOutcome::RateLimited { wait }));
                        waits.push(wait);
                        sleep(wait).await;
                    } else {
                        warn!(
                            caller,
                            attempt = attempt + 1,
                            max_attempts,
                            error = %e,
                            "Generation attempt failed, retrying"
                        );
                        sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        Err(CallFailure {
            attempts: max_attempts,
            waits,
            last_error,
        })
    }

    /// Cumulative counters since construction.
    #[must_use]
    pub fn usage_stats(&self) -> UsageStats {
        let total_input_tokens = self.total_input_tokens.load(Ordering::Relaxed);
        let total_output_tokens = self.total_output_tokens.load(Ordering::Relaxed);
        UsageStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_input_tokens,
            total_output_tokens,
            estimated_total_tokens: total_input_tokens + total_output_tokens,
        }
    }

    async fn pace(&self) {
        let remaining = {
            let last = match self.last_call.lock() {
                Ok(guard) => *guard,
                Err(poisoned) => *poisoned.into_inner(),
            };
            last.map(|at| self.policy.min_call_interval.saturating_sub(at.elapsed()))
        };
        if let Some(remaining) = remaining.filter(|d| !d.is_zero()) {
            debug!(wait_ms = remaining.as_millis() as u64, "Pacing before call");
            sleep(remaining).await;
        }
    }

    fn mark_attempt(&self) {
        let now = Instant::now();
        match self.last_call.lock() {
            Ok(mut guard) => *guard = Some(now),
            Err(poisoned) => *poisoned.into_inner() = Some(now),
        }
    }
}
