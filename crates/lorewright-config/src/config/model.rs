use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use lorewright_utils::types::PhaseCounts;

/// Default Gemini model used for generation.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-exp";

/// Environment variable holding the API key unless overridden.
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Sampling and transport parameters for the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Name of the environment variable that holds the API key
    pub api_key_env: String,
    /// Override for the Gemini REST base URL
    pub base_url: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.9,
            top_p: 0.95,
            max_output_tokens: 8192,
            timeout_secs: 120,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: None,
        }
    }
}

/// Pacing and retry behaviour of the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per call before giving up
    pub max_attempts: u32,
    /// Minimum spacing between calls to the service
    pub min_call_interval_secs: f64,
    /// First rate-limit backoff; doubles per attempt
    pub rate_limit_base_secs: u64,
    /// Ceiling for rate-limit backoff
    pub rate_limit_max_secs: u64,
    /// Pause after a non rate-limit failure
    pub retry_delay_secs: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_call_interval_secs: 2.0,
            rate_limit_base_secs: 4,
            rate_limit_max_secs: 60,
            retry_delay_secs: 1.0,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory holding `<project>_lore_state.json` checkpoints and exports
    pub state_dir: PathBuf,
    /// Directory holding name pools, event templates, banned words and game inspirations
    pub data_dir: PathBuf,
    /// Append-only API usage log; `None` disables it
    pub usage_log: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
            data_dir: PathBuf::from("data"),
            usage_log: Some(PathBuf::from("logs/api_usage.log")),
        }
    }
}

/// `[generation]` as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GenerationSection {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
}

/// `[retry]` as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RetrySection {
    pub max_attempts: Option<u32>,
    pub min_call_interval_secs: Option<f64>,
    pub rate_limit_base_secs: Option<u64>,
    pub rate_limit_max_secs: Option<u64>,
    pub retry_delay_secs: Option<f64>,
}

/// `[paths]` as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PathsSection {
    pub state_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub usage_log: Option<PathBuf>,
    pub disable_usage_log: Option<bool>,
}

/// `[counts]` as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CountsSection {
    pub eras: Option<u32>,
    pub factions: Option<u32>,
    pub characters: Option<u32>,
    pub conflicts: Option<u32>,
    pub chapters_per_route: Option<u32>,
}

impl CountsSection {
    pub(crate) fn fields(&self) -> [(&'static str, Option<u32>); 5] {
        [
            ("counts_eras", self.eras),
            ("counts_factions", self.factions),
            ("counts_characters", self.characters),
            ("counts_conflicts", self.conflicts),
            ("counts_chapters_per_route", self.chapters_per_route),
        ]
    }
}

pub(crate) fn count_slot<'a>(counts: &'a mut PhaseCounts, key: &str) -> Option<&'a mut u32> {
    match key {
        "counts_eras" => Some(&mut counts.eras),
        "counts_factions" => Some(&mut counts.factions),
        "counts_characters" => Some(&mut counts.characters),
        "counts_conflicts" => Some(&mut counts.conflicts),
        "counts_chapters_per_route" => Some(&mut counts.chapters_per_route),
        _ => None,
    }
}
