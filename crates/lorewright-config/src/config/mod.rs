use std::collections::HashMap;
use std::path::PathBuf;

use lorewright_utils::error::ConfigError;
use lorewright_utils::types::{ConfigSource, PhaseCounts};

mod builder;
mod discovery;
mod model;
mod sources;

pub use builder::ConfigBuilder;
pub use model::{
    DEFAULT_API_KEY_ENV, DEFAULT_MODEL, GenerationSettings, PathSettings, RetrySettings,
};

/// Effective configuration after all layers have been merged.
#[derive(Debug, Clone)]
pub struct Config {
    pub generation: GenerationSettings,
    pub retry: RetrySettings,
    pub paths: PathSettings,
    /// Default per-phase counts used when a command does not pass its own
    pub counts: PhaseCounts,
    pub verbose: bool,
    /// Where each resolved key came from, keyed by its `effective_config` name
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Values supplied on the command line.
///
/// Every field is optional; `None` means "not given" and lets lower layers win.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub max_attempts: Option<u32>,
    pub verbose: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            retry: RetrySettings::default(),
            paths: PathSettings::default(),
            counts: PhaseCounts::default(),
            verbose: false,
            source_attribution: HashMap::new(),
        }
    }
}

impl Config {
    /// Check value ranges after merging.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, value: String| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            })
        };

        if self.retry.max_attempts == 0 {
            return invalid("max_attempts", "0".to_string());
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return invalid("temperature", self.generation.temperature.to_string());
        }
        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            return invalid("top_p", self.generation.top_p.to_string());
        }
        if self.generation.max_output_tokens == 0 {
            return invalid("max_output_tokens", "0".to_string());
        }
        if self.generation.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("model".to_string()));
        }
        if self.retry.min_call_interval_secs < 0.0 || !self.retry.min_call_interval_secs.is_finite()
        {
            return invalid(
                "min_call_interval_secs",
                self.retry.min_call_interval_secs.to_string(),
            );
        }
        if self.retry.retry_delay_secs < 0.0 || !self.retry.retry_delay_secs.is_finite() {
            return invalid("retry_delay_secs", self.retry.retry_delay_secs.to_string());
        }
        if self.retry.rate_limit_max_secs < self.retry.rate_limit_base_secs {
            return invalid(
                "rate_limit_max_secs",
                format!(
                    "{} (below rate_limit_base_secs = {})",
                    self.retry.rate_limit_max_secs, self.retry.rate_limit_base_secs
                ),
            );
        }
        Ok(())
    }

    /// Minimal configuration for tests: no usage log, no pacing.
    #[doc(hidden)]
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        let mut config = Self::default();
        config.paths.usage_log = None;
        config.retry.min_call_interval_secs = 0.0;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        match config.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "max_attempts"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_backoff_ceiling_below_base_rejected() {
        let mut config = Config::default();
        config.retry.rate_limit_base_secs = 10;
        config.retry.rate_limit_max_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_top_p_range() {
        let mut config = Config::default();
        config.generation.top_p = 0.0;
        assert!(config.validate().is_err());
        config.generation.top_p = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_model_is_missing() {
        let mut config = Config::default();
        config.generation.model = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
