use std::path::PathBuf;

use lorewright_utils::error::ConfigError;
use lorewright_utils::types::{ConfigSource, PhaseCounts};

use super::Config;

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the pipeline without environment variables or
    /// config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lorewright_config::Config;
    ///
    /// let config = Config::builder()
    ///     .state_dir("/tmp/worlds")
    ///     .max_attempts(3)
    ///     .min_call_interval_secs(0.0)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.retry.max_attempts, 3);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`].
///
/// Every value set here is attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    api_key_env: Option<String>,
    base_url: Option<String>,
    max_attempts: Option<u32>,
    min_call_interval_secs: Option<f64>,
    rate_limit_base_secs: Option<u64>,
    rate_limit_max_secs: Option<u64>,
    retry_delay_secs: Option<f64>,
    state_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    usage_log: Option<Option<PathBuf>>,
    counts: Option<PhaseCounts>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Point the Gemini backend at a different endpoint (e.g. a local proxy).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn min_call_interval_secs(mut self, secs: f64) -> Self {
        self.min_call_interval_secs = Some(secs);
        self
    }

    /// Set the rate-limit backoff base and ceiling together.
    #[must_use]
    pub fn rate_limit_backoff(mut self, base_secs: u64, max_secs: u64) -> Self {
        self.rate_limit_base_secs = Some(base_secs);
        self.rate_limit_max_secs = Some(max_secs);
        self
    }

    #[must_use]
    pub fn retry_delay_secs(mut self, secs: f64) -> Self {
        self.retry_delay_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn state_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set the usage log path; `None` disables the log.
    #[must_use]
    pub fn usage_log(mut self, path: Option<PathBuf>) -> Self {
        self.usage_log = Some(path);
        self
    }

    #[must_use]
    pub fn counts(mut self, counts: PhaseCounts) -> Self {
        self.counts = Some(counts);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of the resulting configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        let mut touched: Vec<&str> = Vec::new();
        if self.model.is_some() {
            touched.push("model");
        }
        if self.temperature.is_some() {
            touched.push("temperature");
        }
        if self.max_output_tokens.is_some() {
            touched.push("max_output_tokens");
        }
        if self.api_key_env.is_some() {
            touched.push("api_key_env");
        }
        if self.base_url.is_some() {
            touched.push("base_url");
        }
        if self.max_attempts.is_some() {
            touched.push("max_attempts");
        }
        if self.min_call_interval_secs.is_some() {
            touched.push("min_call_interval_secs");
        }
        if self.rate_limit_base_secs.is_some() {
            touched.push("rate_limit_base_secs");
            touched.push("rate_limit_max_secs");
        }
        if self.retry_delay_secs.is_some() {
            touched.push("retry_delay_secs");
        }
        if self.state_dir.is_some() {
            touched.push("state_dir");
        }
        if self.data_dir.is_some() {
            touched.push("data_dir");
        }
        if self.usage_log.is_some() {
            touched.push("usage_log");
        }
        if self.counts.is_some() {
            touched.extend([
                "counts_eras",
                "counts_factions",
                "counts_characters",
                "counts_conflicts",
                "counts_chapters_per_route",
            ]);
        }
        if self.verbose.is_some() {
            touched.push("verbose");
        }
        for key in touched {
            config
                .source_attribution
                .insert(key.to_string(), ConfigSource::Programmatic);
        }

        if let Some(model) = self.model {
            config.generation.model = model;
        }
        if let Some(temperature) = self.temperature {
            config.generation.temperature = temperature;
        }
        if let Some(tokens) = self.max_output_tokens {
            config.generation.max_output_tokens = tokens;
        }
        if let Some(var) = self.api_key_env {
            config.generation.api_key_env = var;
        }
        if self.base_url.is_some() {
            config.generation.base_url = self.base_url;
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(secs) = self.min_call_interval_secs {
            config.retry.min_call_interval_secs = secs;
        }
        if let Some(base) = self.rate_limit_base_secs {
            config.retry.rate_limit_base_secs = base;
        }
        if let Some(max) = self.rate_limit_max_secs {
            config.retry.rate_limit_max_secs = max;
        }
        if let Some(secs) = self.retry_delay_secs {
            config.retry.retry_delay_secs = secs;
        }
        if let Some(dir) = self.state_dir {
            config.paths.state_dir = dir;
        }
        if let Some(dir) = self.data_dir {
            config.paths.data_dir = dir;
        }
        if let Some(log) = self.usage_log {
            config.paths.usage_log = log;
        }
        if let Some(counts) = self.counts {
            config.counts = counts;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }

        config.validate()?;
        Ok(config)
    }
}
