//! Best-effort JSON extraction.
//!
//! Models wrap their JSON in code fences, preface it with prose, or trail off
//! with commentary. [`extract_json`] strips a leading code fence and then keeps
//! the span from the first `{` to the last `}`. This is a heuristic: an
//! unbalanced brace inside a string value can still produce an invalid
//! candidate, which [`parse`] then reports as a [`ParseFailure`].

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::Record;

/// Characters of the raw response kept in a [`ParseFailure`]
pub const RAW_EXCERPT_CHARS: usize = 500;

const FENCE: &str = "```";

/// The candidate text was not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response is not a JSON object: {error}")]
pub struct ParseFailure {
    pub error: String,
    /// Leading part of the original response, for diagnostics
    pub raw_excerpt: String,
}

/// Reduce `raw` to the most likely JSON object substring.
#[must_use]
pub fn extract_json(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    if text.starts_with(FENCE) {
        let lines: Vec<&str> = text.split('\n').collect();
        // Without a closing fence the last line is dropped along with the opener.
        let end = lines
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, line)| line.trim() == FENCE)
            .map_or(lines.len().saturating_sub(1), |(i, _)| i);
        text = lines.get(1..end).map(|l| l.join("\n")).unwrap_or_default();
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && start < end
    {
        text = text[start..=end].to_string();
    }

    text
}

/// Strictly parse `candidate` as a JSON object.
///
/// # Errors
///
/// Returns [`ParseFailure`] when the candidate is not valid JSON or is valid
/// JSON of another type. `raw` supplies the diagnostic excerpt.
pub fn parse(candidate: &str, raw: &str) -> Result<Record, ParseFailure> {
    let failure = |error: String| ParseFailure {
        error,
        raw_excerpt: raw.chars().take(RAW_EXCERPT_CHARS).collect(),
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(failure(format!("expected an object, found {}", kind(&other)))),
        Err(e) => {
            debug!(error = %e, "Candidate JSON failed to parse");
            Err(failure(e.to_string()))
        }
    }
}

/// [`extract_json`] followed by [`parse`].
///
/// # Errors
///
/// See [`parse`].
pub fn normalize(raw: &str) -> Result<Record, ParseFailure> {
    parse(&extract_json(raw), raw)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
