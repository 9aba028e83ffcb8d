use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use lorewright_utils::error::ConfigError;

use super::model::{CountsSection, GenerationSection, PathsSection, RetrySection, count_slot};
use super::{CliArgs, Config, ConfigSource, GenerationSettings, PathSettings, RetrySettings};
use lorewright_utils::types::PhaseCounts;

pub(crate) const ENV_MODEL: &str = "LOREWRIGHT_MODEL";
pub(crate) const ENV_STATE_DIR: &str = "LOREWRIGHT_STATE_DIR";
pub(crate) const ENV_DATA_DIR: &str = "LOREWRIGHT_DATA_DIR";
pub(crate) const ENV_MAX_ATTEMPTS: &str = "LOREWRIGHT_MAX_ATTEMPTS";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    generation: Option<GenerationSection>,
    retry: Option<RetrySection>,
    paths: Option<PathsSection>,
    counts: Option<CountsSection>,
}

/// Keys that always carry an attribution, even when untouched.
const ATTRIBUTED_KEYS: &[&str] = &[
    "model",
    "temperature",
    "top_p",
    "max_output_tokens",
    "timeout_secs",
    "api_key_env",
    "max_attempts",
    "min_call_interval_secs",
    "rate_limit_base_secs",
    "rate_limit_max_secs",
    "retry_delay_secs",
    "state_dir",
    "data_dir",
    "usage_log",
    "counts_eras",
    "counts_factions",
    "counts_characters",
    "counts_conflicts",
    "counts_chapters_per_route",
    "verbose",
];

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    ///
    /// # Errors
    ///
    /// Fails when the current directory is unavailable, a config file exists
    /// but cannot be parsed, an environment override is malformed, or the
    /// merged configuration does not validate.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory.
    ///
    /// # Errors
    ///
    /// See [`Config::discover`].
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_env(start_dir, cli_args, |key| std::env::var(key).ok())
    }

    /// Path- and environment-driven variant used by tests to avoid process-global state.
    pub(crate) fn discover_with_env<F>(start_dir: &Path, cli_args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut source_attribution: HashMap<String, ConfigSource> = ATTRIBUTED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        let mut generation = GenerationSettings::default();
        let mut retry = RetrySettings::default();
        let mut paths = PathSettings::default();
        let mut counts = PhaseCounts::default();
        let mut verbose = false;

        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Loading config file");
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            apply_file(
                file_config,
                &mut generation,
                &mut retry,
                &mut paths,
                &mut counts,
                &mut source_attribution,
            );
        }

        // Environment overrides the file
        if let Some(model) = env(ENV_MODEL).filter(|v| !v.is_empty()) {
            generation.model = model;
            source_attribution.insert("model".to_string(), ConfigSource::Env);
        }
        if let Some(dir) = env(ENV_STATE_DIR).filter(|v| !v.is_empty()) {
            paths.state_dir = PathBuf::from(dir);
            source_attribution.insert("state_dir".to_string(), ConfigSource::Env);
        }
        if let Some(dir) = env(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            paths.data_dir = PathBuf::from(dir);
            source_attribution.insert("data_dir".to_string(), ConfigSource::Env);
        }
        if let Some(raw) = env(ENV_MAX_ATTEMPTS).filter(|v| !v.is_empty()) {
            retry.max_attempts = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "max_attempts".to_string(),
                value: format!("{raw} (from {ENV_MAX_ATTEMPTS})"),
            })?;
            source_attribution.insert("max_attempts".to_string(), ConfigSource::Env);
        }

        // CLI overrides everything
        if let Some(model) = &cli_args.model {
            generation.model = model.clone();
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(dir) = &cli_args.state_dir {
            paths.state_dir = dir.clone();
            source_attribution.insert("state_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(dir) = &cli_args.data_dir {
            paths.data_dir = dir.clone();
            source_attribution.insert("data_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(attempts) = cli_args.max_attempts {
            retry.max_attempts = attempts;
            source_attribution.insert("max_attempts".to_string(), ConfigSource::Cli);
        }
        if let Some(flag) = cli_args.verbose {
            verbose = flag;
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            generation,
            retry,
            paths,
            counts,
            verbose,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory.
    ///
    /// Walks up the directory tree looking for `.lorewright/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or filesystem root.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for permission errors.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".lorewright").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content)
                    .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
                Ok(config)
            }
            // Missing explicit file falls back to defaults
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

fn apply_file(
    file_config: TomlConfig,
    generation: &mut GenerationSettings,
    retry: &mut RetrySettings,
    paths: &mut PathSettings,
    counts: &mut PhaseCounts,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    let mut mark = |key: &str| {
        attribution.insert(key.to_string(), ConfigSource::Config);
    };

    if let Some(section) = file_config.generation {
        if let Some(model) = section.model {
            generation.model = model;
            mark("model");
        }
        if let Some(temperature) = section.temperature {
            generation.temperature = temperature;
            mark("temperature");
        }
        if let Some(top_p) = section.top_p {
            generation.top_p = top_p;
            mark("top_p");
        }
        if let Some(max) = section.max_output_tokens {
            generation.max_output_tokens = max;
            mark("max_output_tokens");
        }
        if let Some(timeout) = section.timeout_secs {
            generation.timeout_secs = timeout;
            mark("timeout_secs");
        }
        if let Some(var) = section.api_key_env {
            generation.api_key_env = var;
            mark("api_key_env");
        }
        if let Some(url) = section.base_url {
            generation.base_url = Some(url);
            mark("base_url");
        }
    }

    if let Some(section) = file_config.retry {
        if let Some(attempts) = section.max_attempts {
            retry.max_attempts = attempts;
            mark("max_attempts");
        }
        if let Some(interval) = section.min_call_interval_secs {
            retry.min_call_interval_secs = interval;
            mark("min_call_interval_secs");
        }
        if let Some(base) = section.rate_limit_base_secs {
            retry.rate_limit_base_secs = base;
            mark("rate_limit_base_secs");
        }
        if let Some(max) = section.rate_limit_max_secs {
            retry.rate_limit_max_secs = max;
            mark("rate_limit_max_secs");
        }
        if let Some(delay) = section.retry_delay_secs {
            retry.retry_delay_secs = delay;
            mark("retry_delay_secs");
        }
    }

    if let Some(section) = file_config.paths {
        if let Some(dir) = section.state_dir {
            paths.state_dir = dir;
            mark("state_dir");
        }
        if let Some(dir) = section.data_dir {
            paths.data_dir = dir;
            mark("data_dir");
        }
        if let Some(log) = section.usage_log {
            paths.usage_log = Some(log);
            mark("usage_log");
        }
        if section.disable_usage_log == Some(true) {
            paths.usage_log = None;
            mark("usage_log");
        }
    }

    if let Some(section) = file_config.counts {
        for (key, value) in section.fields() {
            if let (Some(value), Some(slot)) = (value, count_slot(counts, key)) {
                *slot = value;
                mark(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let config_dir = dir.join(".lorewright");
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env).unwrap();

        assert_eq!(config.generation.model, super::super::DEFAULT_MODEL);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.counts, PhaseCounts::default());
        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_file_discovered_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            r#"
[generation]
model = "models/gemini-1.5-pro"

[counts]
factions = 3
chapters_per_route = 7
"#,
        );
        let nested = temp.path().join("worlds/draft");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_with_env(&nested, &CliArgs::default(), no_env).unwrap();

        assert_eq!(config.generation.model, "models/gemini-1.5-pro");
        assert_eq!(config.counts.factions, 3);
        assert_eq!(config.counts.chapters_per_route, 7);
        assert_eq!(config.counts.eras, 4);
        assert_eq!(
            config.source_attribution.get("counts_factions"),
            Some(&ConfigSource::Config)
        );
        assert_eq!(
            config.source_attribution.get("counts_eras"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_search_stops_at_repository_root() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[retry]\nmax_attempts = 9\n");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        let found = Config::discover_config_file_from(&repo).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            "[generation]\nmodel = \"from-file\"\n[retry]\nmax_attempts = 2\n",
        );

        let env = |key: &str| match key {
            ENV_MODEL => Some("from-env".to_string()),
            ENV_MAX_ATTEMPTS => Some("7".to_string()),
            _ => None,
        };

        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), env).unwrap();
        assert_eq!(config.generation.model, "from-env");
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(
            config.source_attribution.get("max_attempts"),
            Some(&ConfigSource::Env)
        );

        let cli = CliArgs {
            model: Some("from-cli".to_string()),
            ..CliArgs::default()
        };
        let config = Config::discover_with_env(temp.path(), &cli, env).unwrap();
        assert_eq!(config.generation.model, "from-cli");
        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    fn test_malformed_env_attempts_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let env = |key: &str| (key == ENV_MAX_ATTEMPTS).then(|| "many".to_string());

        let err = Config::discover_with_env(temp.path(), &CliArgs::default(), env).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[generation]\nmodle = \"typo\"\n");

        let result = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env);
        assert!(result.is_err());
    }

    #[test]
    fn test_disable_usage_log() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[paths]\ndisable_usage_log = true\n");

        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env).unwrap();
        assert!(config.paths.usage_log.is_none());
    }

    #[test]
    fn test_explicit_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };

        let config = Config::discover_with_env(temp.path(), &cli, no_env).unwrap();
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn test_invalid_merged_value_fails_validation() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[generation]\ntemperature = 3.5\n");

        let result = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env);
        assert!(result.is_err());
    }
}
