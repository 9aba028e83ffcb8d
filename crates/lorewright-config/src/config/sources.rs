use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).as_str().to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add("model", self.generation.model.clone());
        add("temperature", self.generation.temperature.to_string());
        add("top_p", self.generation.top_p.to_string());
        add(
            "max_output_tokens",
            self.generation.max_output_tokens.to_string(),
        );
        add("timeout_secs", self.generation.timeout_secs.to_string());
        add("api_key_env", self.generation.api_key_env.clone());
        if let Some(url) = &self.generation.base_url {
            add("base_url", url.clone());
        }

        add("max_attempts", self.retry.max_attempts.to_string());
        add(
            "min_call_interval_secs",
            self.retry.min_call_interval_secs.to_string(),
        );
        add(
            "rate_limit_base_secs",
            self.retry.rate_limit_base_secs.to_string(),
        );
        add(
            "rate_limit_max_secs",
            self.retry.rate_limit_max_secs.to_string(),
        );
        add("retry_delay_secs", self.retry.retry_delay_secs.to_string());

        add("state_dir", self.paths.state_dir.display().to_string());
        add("data_dir", self.paths.data_dir.display().to_string());
        add(
            "usage_log",
            self.paths
                .usage_log
                .as_ref()
                .map_or_else(|| "disabled".to_string(), |p| p.display().to_string()),
        );

        add("counts_eras", self.counts.eras.to_string());
        add("counts_factions", self.counts.factions.to_string());
        add("counts_characters", self.counts.characters.to_string());
        add("counts_conflicts", self.counts.conflicts.to_string());
        add(
            "counts_chapters_per_route",
            self.counts.chapters_per_route.to_string(),
        );

        add("verbose", self.verbose.to_string());

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_reports_sources() {
        let config = Config::builder().max_attempts(3).build().unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective.get("max_attempts"),
            Some(&("3".to_string(), "programmatic".to_string()))
        );
        assert_eq!(effective.get("model").map(|(_, s)| s.as_str()), Some("default"));
        assert!(!effective.contains_key("base_url"));
    }

    #[test]
    fn test_disabled_usage_log_rendered() {
        let config = Config::builder().usage_log(None).build().unwrap();
        assert_eq!(
            config.effective_config()["usage_log"].0,
            "disabled".to_string()
        );
    }
}
