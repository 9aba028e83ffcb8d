//! Gemini HTTP backend
//!
//! Talks to the Generative Language REST API (`generateContent` and
//! `countTokens`). Safety filters are disabled for all four harm categories;
//! dark-fantasy lore routinely trips them otherwise.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{GenerationConfig, LlmBackend, LlmInvocation, LlmResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Clone)]
pub struct GeminiBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    count_timeout: Duration,
}

impl GeminiBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            default_model,
            count_timeout: timeout,
        })
    }

    /// Build the backend from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable
    /// is unset or empty, or the HTTP client cannot be constructed.
    pub fn new_from_config(config: &lorewright_config::Config) -> Result<Self, LlmError> {
        let settings = &config.generation;
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Gemini API key not found in environment variable '{}'. \
                     Set it or configure a different api_key_env in [generation].",
                    settings.api_key_env
                ))
            })?;

        Self::new(
            api_key,
            settings.base_url.clone(),
            settings.model.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        let model = if model.is_empty() {
            self.default_model.as_str()
        } else {
            model
        };
        if model.starts_with("models/") {
            format!("{}/{model}:{method}", self.base_url)
        } else {
            format!("{}/models/{model}:{method}", self.base_url)
        }
    }

    fn request_body(prompt: &str, config: &GenerationConfig) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            generation_config: GenerationConfigBody {
                temperature: config.temperature,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_NONE".to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        debug!(
            provider = PROVIDER,
            model = %model,
            caller = %inv.caller,
            max_output_tokens = inv.config.max_output_tokens,
            temperature = inv.config.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let body = Self::request_body(&inv.prompt, &inv.config);
        let request = self
            .client
            .client()
            .post(self.endpoint(&model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        let text = parsed.text().ok_or_else(|| {
            let reason = parsed
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
                .unwrap_or_else(|| "no text candidates".to_string());
            LlmError::Transport(format!("Gemini response missing text content: {reason}"))
        })?;

        let mut result = LlmResult::new(text, PROVIDER, model);
        if let Some(usage) = parsed.usage_metadata {
            result.tokens_input = usage.prompt_token_count;
            result.tokens_output = usage.candidates_token_count;
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Gemini invocation completed"
        );

        Ok(result)
    }

    async fn count_tokens(&self, text: &str) -> Result<u64, LlmError> {
        let body = CountTokensRequest {
            contents: vec![Content::user(text)],
        };
        let request = self
            .client
            .client()
            .post(self.endpoint("", "countTokens"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response = self
            .client
            .execute(request, self.count_timeout, PROVIDER)
            .await?;
        let parsed: CountTokensResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse countTokens response: {e}")))?;
        Ok(parsed.total_tokens)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfigBody,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct CountTokensRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: Option<&str>) -> GeminiBackend {
        GeminiBackend::new(
            "test-key".to_string(),
            base_url.map(str::to_string),
            "models/gemini-2.0-flash-exp".to_string(),
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_uses_default_model() {
        let backend = backend(None);
        assert_eq!(
            backend.endpoint("", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_endpoint_adds_models_prefix() {
        let backend = backend(Some("http://localhost:8080/v1beta/"));
        assert_eq!(
            backend.endpoint("gemini-1.5-pro", "countTokens"),
            "http://localhost:8080/v1beta/models/gemini-1.5-pro:countTokens"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiBackend::request_body("Forge an era", &GenerationConfig::default());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "Forge an era");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert!((json["generationConfig"]["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
        let safety = json["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("{\"a\": 1}"));
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, Some(12));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.text().is_none());
        assert_eq!(
            parsed.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn test_new_from_config_missing_api_key() {
        let mut config = lorewright_config::Config::minimal_for_testing();
        config.generation.api_key_env = "LOREWRIGHT_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        let err = GeminiBackend::new_from_config(&config)
            .err()
            .expect("missing key should fail");
        match err {
            LlmError::Misconfiguration(msg) => {
                assert!(msg.contains("LOREWRIGHT_TEST_KEY_THAT_IS_NEVER_SET"));
            }
            other => panic!("Expected Misconfiguration, got {other:?}"),
        }
    }
}
