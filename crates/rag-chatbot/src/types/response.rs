//! Response types for the HTTP API

use serde::{Deserialize, Serialize};

use super::hit::{DocHit, WebHit};

/// Whether a source came from the document index or the web
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Doc,
    Web,
}

/// A source shown next to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: Option<String>,
    pub kind: SourceKind,
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Source {
    /// Source for a document hit
    pub fn from_doc_hit(hit: &DocHit) -> Self {
        Self {
            title: Some(hit.title().to_string()),
            kind: SourceKind::Doc,
            score: Some(hit.score),
            page: hit.meta.page,
            path: Some(hit.meta.path.clone()),
            url: None,
        }
    }

    /// Source for a web hit
    pub fn from_web_hit(hit: &WebHit) -> Self {
        Self {
            title: Some(hit.display_title().to_string()),
            kind: SourceKind::Web,
            score: hit.score,
            page: None,
            path: None,
            url: Some(hit.url.clone()),
        }
    }
}

/// Response from `POST /api/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub ok: bool,
    pub answer: String,
    pub sources: Vec<Source>,
    /// Pipeline trace (debug requests only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<serde_json::Value>,
    pub mode: String,
    pub trace_id: String,
}

/// Response from `POST /api/ingest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ok: bool,
    /// Number of distinct documents in the rebuilt index
    pub indexed_docs: usize,
    pub trace_id: String,
}

/// A file the upload endpoint refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedUpload {
    /// File name as sent by the client
    pub name: String,
    pub reason: String,
}

/// Response from `POST /api/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    /// Stored file names (after sanitising and de-duplication)
    pub saved: Vec<String>,
    pub skipped: Vec<SkippedUpload>,
    pub upload_dir: String,
    pub trace_id: String,
}

/// Response from `POST /api/reset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub ok: bool,
    pub message: String,
    pub trace_id: String,
}

/// A document present in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub path: String,
    pub name: String,
    /// Number of indexed chunks
    pub chunks: usize,
    /// Page count, when known
    pub pages: Option<u32>,
}

/// Response from `GET /api/files`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub ok: bool,
    pub has_index: bool,
    pub files: Vec<IndexedFile>,
    pub trace_id: String,
}
