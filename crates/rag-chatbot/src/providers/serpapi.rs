//! SerpAPI client for Google web and news search

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::types::hit::SearchHit;

use super::retry::{Attempt, RetryPolicy};
use super::search::{dedup_by_url, diversify_by_domain, WebSearchProvider};

/// SerpAPI client with backoff
pub struct SerpApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    hl: String,
    gl: String,
    safe: String,
    num: usize,
    max_per_domain: usize,
    retry: RetryPolicy,
}

fn str_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Normalise `organic_results`
pub fn normalize_organic(data: &Value) -> Vec<SearchHit> {
    data.get("organic_results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| SearchHit {
                    position: item
                        .get("position")
                        .and_then(Value::as_u64)
                        .and_then(|p| u32::try_from(p).ok()),
                    title: str_field(item, "title"),
                    url: str_field(item, "link"),
                    snippet: str_field(item, "snippet"),
                    source: None,
                    date: None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Normalise `news_results`; positions are assigned in order
pub fn normalize_news(data: &Value) -> Vec<SearchHit> {
    data.get("news_results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .zip(1u32..)
                .map(|(item, position)| SearchHit {
                    position: Some(position),
                    title: str_field(item, "title"),
                    url: str_field(item, "link").or_else(|| str_field(item, "news_url")),
                    snippet: str_field(item, "snippet"),
                    source: item.get("source").and_then(|s| match s {
                        Value::String(name) => Some(name.clone()),
                        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                        _ => None,
                    }),
                    date: str_field(item, "date"),
                })
                .collect()
        })
        .unwrap_or_default()
}

impl SerpApiClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs.max(1) * 3))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            hl: config.hl.clone(),
            gl: config.gl.clone(),
            safe: config.safe.clone(),
            num: config.num.max(1),
            max_per_domain: config.max_per_domain.max(1),
            retry: RetryPolicy::new(config.retries.saturating_sub(1), Duration::from_secs(1)),
        })
    }

    /// Override the backoff base delay
    pub fn with_retry_delay(mut self, base_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Config("SERP_API_KEY (or SERPAPI_API_KEY) is not set (check .env)".to_string())
        })
    }

    /// One `/search.json` call with backoff
    async fn call(&self, params: Vec<(&'static str, String)>) -> Result<Value> {
        let url = format!("{}/search.json", self.base_url);
        let client = self.client.clone();

        let data: Value = self
            .retry
            .run("SerpAPI call", || {
                let client = client.clone();
                let url = url.clone();
                let params = params.clone();

                async move {
                    let response = client
                        .get(&url)
                        .query(&params)
                        .send()
                        .await
                        .map_err(|e| Attempt::Retry(Error::search(format!("request failed: {}", e))))?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Attempt::from_status(
                            status,
                            Error::search(format!("HTTP {} - {}", status, body)),
                        ));
                    }

                    response
                        .json::<Value>()
                        .await
                        .map_err(|e| Attempt::Retry(Error::search(format!("invalid response: {}", e))))
                }
            })
            .await?;

        if let Some(message) = data.get("error").and_then(Value::as_str) {
            tracing::warn!("SerpAPI reported: {}", message);
        }
        Ok(data)
    }

    /// Google search with paging, URL de-duplication and per-domain cap
    pub async fn google_search(&self, query: &str, pages: usize, tbs: Option<&str>) -> Result<Vec<SearchHit>> {
        let api_key = self.api_key()?.to_string();
        let mut seen = HashSet::new();
        let mut all_hits = Vec::new();

        for page in 0..pages.max(1) {
            let mut params = vec![
                ("engine", "google".to_string()),
                ("q", query.to_string()),
                ("api_key", api_key.clone()),
                ("hl", self.hl.clone()),
                ("gl", self.gl.clone()),
                ("safe", self.safe.clone()),
                ("num", self.num.to_string()),
                ("start", (page * self.num).to_string()),
            ];
            if let Some(tbs) = tbs {
                params.push(("tbs", tbs.to_string()));
            }

            let hits = normalize_organic(&self.call(params).await?);
            let page_len = hits.len();
            all_hits.extend(dedup_by_url(hits, &mut seen));

            if page_len < self.num {
                break;
            }
        }

        tracing::debug!("web search '{}' returned {} hits", query, all_hits.len());
        Ok(diversify_by_domain(all_hits, self.max_per_domain))
    }

    /// Google News search
    pub async fn news(&self, query: &str) -> Result<Vec<SearchHit>> {
        let params = vec![
            ("engine", "google_news".to_string()),
            ("q", query.to_string()),
            ("api_key", self.api_key()?.to_string()),
            ("hl", self.hl.clone()),
            ("gl", self.gl.clone()),
            ("num", self.num.to_string()),
        ];
        Ok(normalize_news(&self.call(params).await?))
    }
}

#[async_trait]
impl WebSearchProvider for SerpApiClient {
    async fn search(&self, query: &str, pages: usize) -> Result<Vec<SearchHit>> {
        self.google_search(query, pages, None).await
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}
