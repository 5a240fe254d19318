//! Chat completion provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the model for a JSON object response
    pub json_response: bool,
}

impl ChatOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            json_response: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Call metadata kept for traces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatMeta {
    /// Wall time of the call in milliseconds
    pub ms: u64,
    pub usage: Option<serde_json::Value>,
    pub finish_reason: Option<String>,
    pub id: Option<String>,
    pub model: String,
}

/// Completion text with its metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOutput {
    pub text: String,
    pub meta: ChatMeta,
}

/// Trait for chat-completion backends
///
/// Implementations:
/// - `OpenAiClient`: OpenAI-compatible `/chat/completions`
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one chat completion
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatOutput>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
