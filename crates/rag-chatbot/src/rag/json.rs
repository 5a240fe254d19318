//! Lenient JSON extraction from model output

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Why model output could not be read as a JSON object
#[derive(Debug, Error)]
pub enum LooseJsonError {
    #[error("empty")]
    Empty,
    #[error("no_json_object")]
    NoJsonObject,
    #[error("invalid_json: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl LooseJsonError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NoJsonObject => "no_json_object",
            Self::Invalid(_) => "invalid_json",
        }
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(?:json)?\s*|\s*```$").expect("valid regex"))
}

fn object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Strip code fences and surrounding noise, then parse the outermost `{...}` span
pub fn parse_json_loose(text: &str) -> Result<Value, LooseJsonError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LooseJsonError::Empty);
    }
    let unfenced = fence_re().replace_all(trimmed, "");
    let span = object_re()
        .find(&unfenced)
        .ok_or(LooseJsonError::NoJsonObject)?;
    Ok(serde_json::from_str(span.as_str())?)
}
