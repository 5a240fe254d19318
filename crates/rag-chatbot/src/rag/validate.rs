//! Answer validation: cheap rules first, LLM review when a rule fires

use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ChatMessage, ChatOptions, LlmProvider};
use crate::types::Source;

use super::json::parse_json_loose;
use super::prompt::{PromptBuilder, UNKNOWN_MARKER};

/// Answer has no sources and does not admit it is unknown
pub const ERR_UNGROUNDED: &str = "根拠なし回答";
/// Answer is over the length limit
pub const ERR_TOO_LONG: &str = "長すぎ";
/// Reviewer output could not be read
pub const ERR_VALIDATOR_PARSE: &str = "llm_validator_parse_error";

/// Rule findings for an answer; empty means it passed
pub fn rule_validate(text: &str, sources: &[Source], max_chars: usize) -> Vec<String> {
    let mut errors = Vec::new();
    if sources.is_empty() && !text.contains(UNKNOWN_MARKER) {
        errors.push(ERR_UNGROUNDED.to_string());
    }
    if text.chars().count() > max_chars {
        errors.push(ERR_TOO_LONG.to_string());
    }
    errors
}

/// Read `{"ok": bool, "reasons": [...]}` from reviewer output
pub fn review_from_output(text: &str) -> (bool, Vec<String>) {
    let Ok(obj) = parse_json_loose(text) else {
        return (false, vec![ERR_VALIDATOR_PARSE.to_string()]);
    };

    let ok = obj.get("ok").and_then(Value::as_bool).unwrap_or(false);
    let reasons = match obj.get("reasons") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|r| match r {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    };
    (ok, reasons)
}

/// LLM policy reviewer
pub struct AnswerValidator {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl AnswerValidator {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Ask the reviewer whether `answer` follows the answering policy
    pub async fn validate(&self, query: &str, answer: &str) -> Result<(bool, Vec<String>)> {
        let messages = [
            ChatMessage::system(PromptBuilder::validator_system()),
            ChatMessage::user(PromptBuilder::validator_user(query, answer)),
        ];
        let options = ChatOptions::new(&self.model)
            .with_temperature(0.0)
            .with_max_tokens(64);

        let output = self.llm.chat(&messages, &options).await?;
        let (ok, reasons) = review_from_output(&output.text);
        tracing::debug!("llm validator: ok={} reasons={:?}", ok, reasons);
        Ok((ok, reasons))
    }
}
