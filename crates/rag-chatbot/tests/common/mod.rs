//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

use rag_chatbot::config::RagConfig;
use rag_chatbot::error::{Error, Result};
use rag_chatbot::providers::{
    ChatMessage, ChatMeta, ChatOptions, ChatOutput, EmbeddingProvider, LlmProvider, PageFetcher,
    Providers, WebSearchProvider,
};
use rag_chatbot::rag::PromptBuilder;
use rag_chatbot::types::hit::SearchHit;

pub const IN_SCOPE: &str = r#"{"label":"IN","score":0.92,"reason":"補助金"}"#;
pub const OUT_OF_SCOPE: &str = r#"{"label":"OUT","score":0.97,"reason":"無関係"}"#;

/// Chat model answering by the system prompt it receives
pub struct FakeLlm {
    scope: String,
    answer: String,
    review: String,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeLlm {
    pub fn new(scope: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            scope: scope.to_string(),
            answer: answer.to_string(),
            review: r#"{"ok":true,"reasons":[]}"#.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatOutput> {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        let (kind, text) = if system == PromptBuilder::scope_system() {
            ("scope", &self.scope)
        } else if system == PromptBuilder::validator_system() {
            ("review", &self.review)
        } else {
            ("answer", &self.answer)
        };
        self.calls.lock().push(kind);

        Ok(ChatOutput {
            text: text.clone(),
            meta: ChatMeta {
                ms: 1,
                model: options.model.clone(),
                ..Default::default()
            },
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Chat model whose every call fails
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn chat(&self, _messages: &[ChatMessage], _options: &ChatOptions) -> Result<ChatOutput> {
        Err(Error::llm("quota exceeded"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Embeds by counting a few marker words
pub struct KeywordEmbedder;

const MARKERS: [&str; 3] = ["補助金", "申請", "締切"];

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v: Vec<f32> = MARKERS.iter().map(|m| t.matches(m).count() as f32).collect();
                v.push(0.1);
                v
            })
            .collect())
    }

    fn model(&self) -> &str {
        "keyword"
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Search provider with a fixed result list
pub struct FixedSearch(pub Vec<SearchHit>);

#[async_trait]
impl WebSearchProvider for FixedSearch {
    async fn search(&self, _query: &str, _pages: usize) -> Result<Vec<SearchHit>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fetcher returning a canned page per URL
pub struct EchoFetcher;

#[async_trait]
impl PageFetcher for EchoFetcher {
    async fn fetch_text(&self, url: &str) -> String {
        format!("{} 補助金の申請は電子申請で受け付けます。", url)
    }
}

pub fn providers(llm: Arc<dyn LlmProvider>) -> Providers {
    Providers {
        llm,
        embedder: Arc::new(KeywordEmbedder),
        web: Arc::new(FixedSearch(Vec::new())),
        fetcher: Arc::new(EchoFetcher),
    }
}

/// Defaults with input and index directories under `root`
pub fn config_in(root: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.paths.pdf_dir = root.join("pdf");
    config.paths.index_dir = root.join("index");
    config
}
