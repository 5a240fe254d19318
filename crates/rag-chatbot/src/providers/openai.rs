//! OpenAI-compatible client for chat completions and embeddings

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{ChatMessage, ChatMeta, ChatOptions, ChatOutput, LlmProvider};
use super::retry::{Attempt, RetryPolicy};

/// OpenAI API client with automatic retry
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// API root, e.g. `https://api.openai.com/v1`
    base_url: String,
    api_key: Option<String>,
    embed_model: String,
    embed_batch_size: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiClient {
    /// Create a new client. A missing API key is reported on first use.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            embed_model: config.embed_model.clone(),
            embed_batch_size: config.embed_batch_size.max(1),
            retry: RetryPolicy::new(config.max_retries, Duration::from_secs(1)),
        })
    }

    /// Override the backoff base delay
    pub fn with_retry_delay(mut self, base_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set (check .env)".to_string()))
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let key = self.api_key()?.to_string();
        let body = serde_json::to_value(EmbedRequest {
            model: &self.embed_model,
            input: texts,
        })?;
        let client = self.client.clone();

        let mut response: EmbedResponse = self
            .retry
            .run("embedding request", || {
                let client = client.clone();
                let url = url.clone();
                let key = key.clone();
                let body = body.clone();

                async move {
                    let response = client
                        .post(&url)
                        .bearer_auth(&key)
                        .json(&body)
                        .send()
                        .await
                        .map_err(|e| Attempt::Retry(Error::embedding(format!("request failed: {}", e))))?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Attempt::from_status(
                            status,
                            Error::embedding(format!("HTTP {} - {}", status, body)),
                        ));
                    }

                    response
                        .json::<EmbedResponse>()
                        .await
                        .map_err(|e| Attempt::Fatal(Error::embedding(format!("invalid response: {}", e))))
                }
            })
            .await?;

        if response.data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch_size) {
            embeddings.extend(self.embed_chunk(batch).await?);
        }
        Ok(embeddings)
    }

    fn model(&self) -> &str {
        &self.embed_model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatOutput> {
        let url = format!("{}/chat/completions", self.base_url);
        let key = self.api_key()?.to_string();
        let body = serde_json::to_value(ChatRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        })?;
        let client = self.client.clone();

        tracing::debug!("chat completion with model: {}", options.model);
        let started = Instant::now();

        let response: ChatResponse = self
            .retry
            .run("chat completion", || {
                let client = client.clone();
                let url = url.clone();
                let key = key.clone();
                let body = body.clone();

                async move {
                    let response = client
                        .post(&url)
                        .bearer_auth(&key)
                        .json(&body)
                        .send()
                        .await
                        .map_err(|e| Attempt::Retry(Error::llm(format!("request failed: {}", e))))?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Attempt::from_status(
                            status,
                            Error::llm(format!("HTTP {} - {}", status, body)),
                        ));
                    }

                    response
                        .json::<ChatResponse>()
                        .await
                        .map_err(|e| Attempt::Fatal(Error::llm(format!("invalid response: {}", e))))
                }
            })
            .await?;

        let choice = response.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let text = choice
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(ChatOutput {
            text,
            meta: ChatMeta {
                ms: started.elapsed().as_millis() as u64,
                usage: response.usage,
                finish_reason,
                id: response.id,
                model: response.model.unwrap_or_else(|| options.model.clone()),
            },
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let Ok(key) = self.api_key() else {
            return Ok(false);
        };
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}
