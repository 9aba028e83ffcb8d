use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Library-level error type with user-friendly reporting.
///
/// `LoreError` is what lorewright's fallible library operations surface to the
/// CLI. Failures that the pipeline absorbs (exhausted retries, unparseable
/// responses, checkpoint write errors) never become a `LoreError`; they are
/// logged and degrade to empty artifacts instead.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration errors |
/// | 4 | State persistence errors |
/// | 1 | Everything else |
///
/// # Example
///
/// ```rust
/// use lorewright_utils::error::{ConfigError, LoreError};
/// use lorewright_utils::exit_codes::ExitCode;
///
/// let err = LoreError::Config(ConfigError::MissingRequired("model".into()));
/// assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
/// ```
#[derive(Error, Debug)]
pub enum LoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Generation failed: {0}")]
    Generation(String),
}

impl LoreError {
    /// Map this error onto the CLI exit code table.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Store(_) => ExitCode::STATE_PERSISTENCE,
            Self::Generation(_) => ExitCode::GENERATION_ERROR,
            Self::Llm(LlmError::Misconfiguration(_)) => ExitCode::CLI_ARGS,
            Self::Llm(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }

    /// Render the error with context and suggestions for terminal output.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let (message, context, suggestions) = match self {
            Self::Config(e) => (e.user_message(), e.context(), e.suggestions()),
            Self::Llm(e) => (e.user_message(), e.context(), e.suggestions()),
            Self::Store(e) => (e.user_message(), e.context(), e.suggestions()),
            Self::Io(e) => (format!("I/O failure: {e}"), None, Vec::new()),
            Self::Generation(msg) => (format!("Generation failed: {msg}"), None, Vec::new()),
        };

        let mut out = format!("✗ {message}");
        if let Some(context) = context {
            out.push_str(&format!("\n\n  {context}"));
        }
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                out.push_str(&format!("\n  • {suggestion}"));
            }
        }
        out
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Generation => write!(f, "Generation"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [generation], [retry], [paths] and [counts] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => None,
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific range requirements."
            )),
            Self::DiscoveryFailed { .. } => Some(
                "lorewright searches for .lorewright/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Remove unknown sections or keys".to_string(),
            ],
            Self::MissingRequired(key) => vec![format!(
                "Set '{key}' in .lorewright/config.toml or pass it on the command line"
            )],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "max_attempts" => vec!["Use a positive integer (default: 5)".to_string()],
                "temperature" => vec!["Use a value between 0.0 and 2.0".to_string()],
                "top_p" => vec!["Use a value greater than 0.0 and at most 1.0".to_string()],
                _ => vec!["Remove the option to use the default value".to_string()],
            },
            Self::DiscoveryFailed { .. } => vec![
                "Check read permissions on the directory tree".to_string(),
                "Use --config <path> to specify the configuration file explicitly".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised by generation backends.
///
/// The retry layer classifies these into rate-limit and generic failures; only
/// `Misconfiguration` ever escapes to the CLI, when a backend cannot be built.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ProviderQuota(_) => Some(
                "Rate-limited calls are retried with exponential backoff before giving up."
                    .to_string(),
            ),
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => Some(
                "The Gemini backend reads its API key from the environment variable named by [generation] api_key_env."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => vec![
                "Export GOOGLE_API_KEY (or the variable configured in api_key_env)".to_string(),
                "Verify the key is enabled for the Generative Language API".to_string(),
            ],
            Self::ProviderQuota(_) => vec![
                "Raise [retry] min_call_interval_secs to space calls further apart".to_string(),
                "Resume later; completed phases are not re-run".to_string(),
            ],
            Self::Timeout { .. } => {
                vec!["Increase [generation] timeout_secs".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Misconfiguration(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Generation,
        }
    }
}

/// Durable store failures (checkpoint save/load).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No saved state for '{id}' at {path}")]
    NotFound { id: String, path: String },

    #[error("Failed to read state for '{id}': {reason}")]
    ReadFailed { id: String, reason: String },

    #[error("Failed to write state for '{id}': {reason}")]
    WriteFailed { id: String, reason: String },

    #[error("Saved state for '{id}' is not valid: {reason}")]
    Corrupt { id: String, reason: String },
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { id, .. } => format!("No saved lore state found for '{id}'"),
            Self::ReadFailed { id, reason } => {
                format!("Could not read saved state for '{id}': {reason}")
            }
            Self::WriteFailed { id, reason } => {
                format!("Could not save state for '{id}': {reason}")
            }
            Self::Corrupt { id, reason } => {
                format!("Saved state for '{id}' could not be interpreted: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NotFound { path, .. } => Some(format!("Looked for checkpoint file {path}")),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec![
                "Run `lorewright generate <project>` first".to_string(),
                "Check [paths] state_dir or pass --state-dir".to_string(),
            ],
            Self::Corrupt { .. } => vec![
                "Restore the checkpoint from a backup or start over with --fresh".to_string(),
            ],
            _ => vec!["Check file permissions in the state directory".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}
