//! Retrieval hits from the document index and from web search

use serde::{Deserialize, Serialize};

use super::document::ChunkMeta;

/// A chunk returned by vector search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocHit {
    /// Inner product of the normalised vectors (cosine similarity)
    pub score: f32,
    /// Stored chunk metadata
    #[serde(flatten)]
    pub meta: ChunkMeta,
}

impl DocHit {
    /// Display title of the source document
    pub fn title(&self) -> &str {
        if self.meta.doc.is_empty() {
            "document"
        } else {
            &self.meta.doc
        }
    }
}

/// A normalised search engine result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based position on the result page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Publisher (news results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Publication date as reported by the engine (news results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A search result whose page text was fetched and used as context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebHit {
    pub title: Option<String>,
    pub url: String,
    /// 1-based rank among the results considered
    pub rank: usize,
    pub score: Option<f32>,
    pub snippet: String,
}

impl WebHit {
    /// Title, falling back to the URL
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => &self.url,
        }
    }
}
