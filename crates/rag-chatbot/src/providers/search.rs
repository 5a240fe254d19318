//! Web search provider trait and result post-processing

use async_trait::async_trait;
use reqwest::Url;
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::types::hit::SearchHit;

/// Trait for web search backends
///
/// Implementations:
/// - `SerpApiClient`: Google results through SerpAPI
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Search the web, reading up to `pages` result pages
    async fn search(&self, query: &str, pages: usize) -> Result<Vec<SearchHit>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Host (with port) and path of a URL, used to spot duplicates
pub fn url_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = match (parsed.host_str(), parsed.port()) {
                (Some(h), Some(p)) => format!("{}:{}", h, p),
                (Some(h), None) => h.to_string(),
                (None, _) => String::new(),
            };
            format!("{}{}", host, parsed.path())
        }
        Err(_) => url.to_string(),
    }
}

fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(p) => format!("{}:{}", host, p),
        None => host.to_string(),
    })
}

/// Drop hits whose URL key was already seen; hits without a URL are kept
pub fn dedup_by_url(hits: Vec<SearchHit>, seen: &mut HashSet<String>) -> Vec<SearchHit> {
    hits.into_iter()
        .filter(|hit| {
            let key = url_key(hit.url.as_deref().unwrap_or(""));
            key.is_empty() || seen.insert(key)
        })
        .collect()
}

/// Keep at most `max_per_domain` hits per host, preserving order
pub fn diversify_by_domain(hits: Vec<SearchHit>, max_per_domain: usize) -> Vec<SearchHit> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    hits.into_iter()
        .filter(|hit| match hit.url.as_deref().and_then(domain_of) {
            None => true,
            Some(domain) => {
                let count = seen.entry(domain).or_insert(0);
                *count += 1;
                *count <= max_per_domain
            }
        })
        .collect()
}

/// Query restricted to one site
pub fn q_site(keyword: &str, site: &str) -> String {
    format!("site:{} \"{}\"", site, keyword)
}

/// Query restricted to PDF documents
pub fn q_pdf(keyword: &str) -> String {
    format!("\"{}\" filetype:pdf", keyword)
}

/// Query plus time filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentQuery {
    pub q: String,
    /// Google `tbs` parameter, e.g. `qdr:w`
    pub tbs: String,
}

/// Query limited to the last day/week/month/year (`unit` is `d`, `w`, `m` or `y`)
pub fn q_recent(keyword: &str, unit: char) -> RecentQuery {
    RecentQuery {
        q: format!("\"{}\"", keyword),
        tbs: format!("qdr:{}", unit),
    }
}
