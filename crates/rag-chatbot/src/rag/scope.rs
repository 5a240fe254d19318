//! Question scope classification

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ChatMessage, ChatOptions, LlmProvider};

use super::json::parse_json_loose;
use super::prompt::{PromptBuilder, ALLOWED_KEYWORDS};

/// Classifier label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScopeLabel {
    In,
    Out,
    Unsure,
}

impl ScopeLabel {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "IN" => Self::In,
            "OUT" => Self::Out,
            _ => Self::Unsure,
        }
    }
}

impl fmt::Display for ScopeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Unsure => "UNSURE",
        })
    }
}

/// Classifier decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeVerdict {
    pub label: ScopeLabel,
    pub score: f64,
    pub reason: String,
}

impl ScopeVerdict {
    /// In scope with a score of at least `threshold`
    pub fn accepts(&self, threshold: f64) -> bool {
        self.label == ScopeLabel::In && self.score >= threshold
    }
}

/// Raw classifier output kept for the trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeRaw {
    pub raw: String,
    pub model: String,
    pub usage: Option<Value>,
}

/// Interpret classifier output, falling back to keyword matching on the query
pub fn verdict_from_output(text: &str, query: &str) -> ScopeVerdict {
    let parsed = parse_json_loose(text)
        .map_err(|e| e.kind().to_string())
        .and_then(|obj| {
            let label = match obj.get("label") {
                None | Some(Value::Null) => ScopeLabel::Unsure,
                Some(Value::String(s)) => ScopeLabel::parse(s),
                Some(other) => ScopeLabel::parse(&other.to_string()),
            };
            let score = match obj.get("score") {
                None | Some(Value::Null) => 0.0,
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                Some(Value::String(s)) => s.trim().parse().map_err(|_| "invalid_score".to_string())?,
                Some(_) => return Err("invalid_score".to_string()),
            };
            let reason = match obj.get("reason") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            Ok(ScopeVerdict { label, score, reason })
        });

    match parsed {
        Ok(verdict) => verdict,
        Err(_) if ALLOWED_KEYWORDS.iter().any(|k| query.contains(k)) => ScopeVerdict {
            label: ScopeLabel::In,
            score: 0.7,
            reason: "keyword_hit".to_string(),
        },
        Err(kind) => ScopeVerdict {
            label: ScopeLabel::Unsure,
            score: 0.0,
            reason: format!("parse_error:{}", kind),
        },
    }
}

/// LLM-backed classifier with a dedicated system prompt
pub struct ScopeClassifier {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl ScopeClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Classify `query`; LLM transport errors propagate
    pub async fn classify(&self, query: &str) -> Result<(ScopeVerdict, ScopeRaw)> {
        let messages = [
            ChatMessage::system(PromptBuilder::scope_system()),
            ChatMessage::user(PromptBuilder::scope_user(query)),
        ];
        let options = ChatOptions::new(&self.model)
            .with_temperature(0.0)
            .with_max_tokens(64)
            .json();

        let output = self.llm.chat(&messages, &options).await?;
        let verdict = verdict_from_output(&output.text, query);
        tracing::debug!(
            "scope: {} {:.2} ({})",
            verdict.label,
            verdict.score,
            verdict.reason
        );

        Ok((
            verdict,
            ScopeRaw {
                raw: output.text,
                model: self.model.clone(),
                usage: output.meta.usage,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_verdict() {
        let v = verdict_from_output(r#"{"label":"in","score":0.95,"reason":"補助金に直接言及"}"#, "x");
        assert_eq!(v.label, ScopeLabel::In);
        assert!((v.score - 0.95).abs() < 1e-9);
        assert!(v.accepts(0.6));

        let v = verdict_from_output(r#"{"label":"MAYBE","score":"0.4"}"#, "x");
        assert_eq!(v.label, ScopeLabel::Unsure);
        assert!((v.score - 0.4).abs() < 1e-9);
        assert_eq!(v.reason, "");
    }

    #[test]
    fn test_keyword_fallback() {
        let v = verdict_from_output("sorry", "IT導入補助金の上限は？");
        assert_eq!(v.label, ScopeLabel::In);
        assert_eq!(v.score, 0.7);
        assert_eq!(v.reason, "keyword_hit");
        assert!(v.accepts(0.6));
    }

    #[test]
    fn test_parse_error_fallback() {
        let v = verdict_from_output("", "秋葉原のラーメン");
        assert_eq!(v.label, ScopeLabel::Unsure);
        assert_eq!(v.reason, "parse_error:empty");

        let v = verdict_from_output(r#"{"label":"IN","score":[1]}"#, "天気");
        assert_eq!(v.reason, "parse_error:invalid_score");
        assert!(!v.accepts(0.0));
    }

    #[test]
    fn test_low_score_rejected() {
        let v = verdict_from_output(r#"{"label":"IN","score":0.5}"#, "x");
        assert!(!v.accepts(0.6));
    }

    #[test]
    fn test_label_serializes_uppercase() {
        assert_eq!(serde_json::to_value(ScopeLabel::Unsure).unwrap(), "UNSURE");
    }
}
