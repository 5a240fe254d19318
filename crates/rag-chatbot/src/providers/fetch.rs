//! Web page download and visible-text extraction

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;

use crate::error::{Error, Result};

/// Trait for turning a URL into plain text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Visible text of the page, or an empty string when it cannot be fetched
    async fn fetch_text(&self, url: &str) -> String;
}

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extract visible text from HTML, one non-blank text node per line
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }
        let line = text.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }

    lines.join("\n")
}

/// Fetches pages over HTTP
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("rag-chatbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Error pages are read like any other page
    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            tracing::debug!("{} answered {}", url, response.status());
        }
        let body = response.text().await?;
        Ok(html_to_text(&body))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("fetch failed for {}: {}", url, e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><title>補助金</title><style>p{color:red}</style></head>
            <body><h1>概要</h1>
            <script>var x = 1;</script>
            <p>上限は <b>450万円</b></p></body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "補助金\n概要\n上限は\n450万円");
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(html_to_text("just text"), "just text");
        assert_eq!(html_to_text(""), "");
    }

    #[tokio::test]
    async fn test_unreachable_url_is_empty() {
        let fetcher = HttpPageFetcher::new(1).unwrap();
        assert_eq!(fetcher.fetch_text("http://127.0.0.1:9/nothing").await, "");
        assert_eq!(fetcher.fetch_text("not a url").await, "");
    }
}
