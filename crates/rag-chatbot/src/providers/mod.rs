//! Provider abstractions for the external services the chatbot talks to
//!
//! Chat completions and embeddings go to an OpenAI-compatible API, web search
//! goes to SerpAPI, and result pages are downloaded and reduced to text.

pub mod embedding;
pub mod fetch;
pub mod llm;
pub mod openai;
pub mod retry;
pub mod search;
pub mod serpapi;

pub use embedding::EmbeddingProvider;
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use llm::{ChatMessage, ChatMeta, ChatOptions, ChatOutput, LlmProvider};
pub use openai::OpenAiClient;
pub use search::WebSearchProvider;
pub use serpapi::SerpApiClient;

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;

/// The set of providers the pipeline runs against
#[derive(Clone)]
pub struct Providers {
    pub llm: Arc<dyn LlmProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub web: Arc<dyn WebSearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
}

impl Providers {
    /// Build the HTTP-backed providers from configuration
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let openai = Arc::new(OpenAiClient::new(&config.llm)?);
        tracing::info!(
            "Using {} (chat: {}, embeddings: {})",
            LlmProvider::name(openai.as_ref()),
            config.llm.model,
            config.llm.embed_model
        );

        Ok(Self {
            llm: openai.clone(),
            embedder: openai,
            web: Arc::new(SerpApiClient::new(&config.search)?),
            fetcher: Arc::new(HttpPageFetcher::new(config.search.fetch_timeout_secs)?),
        })
    }
}
