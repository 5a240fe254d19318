//! Configuration for the chatbot
//!
//! Values come from built-in defaults, an optional TOML file (`RAG_CONFIG`),
//! the `.env` file and finally process environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default system prompt for answer generation
pub const DEFAULT_SYSTEM_PROMPT: &str = "あなたは日本語で正確に答えるアシスタントです。根拠に基づき簡潔に回答し、不明な点は正直に『不明』と述べてください。";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Input and index locations
    pub paths: PathsConfig,
    /// Chat completion / embedding configuration
    pub llm: LlmConfig,
    /// Web search configuration
    pub search: SearchConfig,
    /// Answer pipeline tuning
    pub answer: AnswerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned by ingestion and written by uploads
    pub pdf_dir: PathBuf,
    /// Directory holding the vector index and chunk metadata
    pub index_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("data/pdf"),
            index_dir: PathBuf::from("data/index"),
        }
    }
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (up to and including `/v1`)
    pub base_url: String,
    /// API key, normally from `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Generation model name
    pub model: String,
    /// Model used by the scope classifier (falls back to `model`)
    pub classifier_model: Option<String>,
    /// Embedding model name
    pub embed_model: String,
    /// Default sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Texts per embedding request
    pub embed_batch_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4.1-nano".to_string(),
            classifier_model: None,
            embed_model: "text-embedding-3-small".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            max_retries: 2,
            embed_batch_size: 64,
        }
    }
}

impl LlmConfig {
    /// Model used for scope classification
    pub fn classifier_model(&self) -> &str {
        self.classifier_model.as_deref().unwrap_or(&self.model)
    }
}

/// SerpAPI web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// SerpAPI base URL
    pub base_url: String,
    /// API key, from `SERP_API_KEY` or `SERPAPI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Interface language
    pub hl: String,
    /// Country
    pub gl: String,
    /// Safe search setting
    pub safe: String,
    /// Results per page
    pub num: usize,
    /// Maximum hits kept per domain
    pub max_per_domain: usize,
    /// Attempts per SerpAPI call
    pub retries: u32,
    /// Timeout for fetching result pages, in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com".to_string(),
            api_key: None,
            hl: "ja".to_string(),
            gl: "jp".to_string(),
            safe: "active".to_string(),
            num: 10,
            max_per_domain: 2,
            retries: 4,
            fetch_timeout_secs: 10,
        }
    }
}

/// Answer pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Number of document / web hits to retrieve
    pub top_k: usize,
    /// Minimum document similarity (0 disables filtering)
    pub threshold: f32,
    /// Minimum classifier score for a question to be answered
    pub scope_threshold: f32,
    /// Contexts passed to the summariser
    pub ctx_max_chunks: usize,
    /// Characters kept per context
    pub ctx_max_chars: usize,
    /// Answers longer than this fail rule validation
    pub max_answer_chars: usize,
    /// Allow clients to request the debug trace
    pub debug_rag: bool,
    /// System prompt for answer generation
    pub system_prompt: String,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            threshold: 0.0,
            scope_threshold: 0.6,
            ctx_max_chunks: 4,
            ctx_max_chars: 1500,
            max_answer_chars: 1200,
            debug_rag: false,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
        }
    }
}

impl RagConfig {
    /// Load configuration: defaults, optional TOML file, `.env`, environment
    pub fn load() -> Result<Self> {
        // Variables already present in the process win over .env
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to read .env: {}", e);
            }
        }

        let mut config = match std::env::var("RAG_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };

        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = parse_var(&get, "PORT")? {
            self.server.port = v;
        }
        if let Some(v) = parse_var(&get, "MAX_UPLOAD_SIZE")? {
            self.server.max_upload_size = v;
        }

        if let Some(v) = get("PDF_DIR") {
            self.paths.pdf_dir = PathBuf::from(v);
        }
        if let Some(v) = get("INDEX_DIR") {
            self.paths.index_dir = PathBuf::from(v);
        }

        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("CLASSIFIER_MODEL") {
            self.llm.classifier_model = Some(v);
        }
        if let Some(v) = get("EMBED_MODEL") {
            self.llm.embed_model = v;
        }
        if let Some(v) = parse_var(&get, "LLM_TEMPERATURE")? {
            self.llm.temperature = v;
        }

        if let Some(v) = get("SERP_API_KEY").or_else(|| get("SERPAPI_API_KEY")) {
            self.search.api_key = Some(v);
        }

        if let Some(v) = parse_var(&get, "RAG_TOP_K")? {
            self.answer.top_k = v;
        }
        if let Some(v) = parse_var(&get, "RAG_THRESHOLD")? {
            self.answer.threshold = v;
        }
        if let Some(v) = parse_var(&get, "SCOPE_THRESHOLD")? {
            self.answer.scope_threshold = v;
        }
        if let Some(v) = parse_var(&get, "MAX_ANSWER_CHARS")? {
            self.answer.max_answer_chars = v;
        }
        if let Some(v) = parse_var(&get, "CTX_MAX_CHUNKS")? {
            self.answer.ctx_max_chunks = v;
        }
        if let Some(v) = parse_var(&get, "CTX_MAX_CHARS")? {
            self.answer.ctx_max_chars = v;
        }
        if let Some(v) = get("DEBUG_RAG") {
            self.answer.debug_rag = is_truthy(&v);
        }
        if let Some(v) = get("SYS_PROMPT") {
            self.answer.system_prompt = v;
        }

        Ok(())
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.chunking.chunk_size == 0 || self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.answer.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".to_string()));
        }
        for (name, value) in [
            ("threshold", self.answer.threshold),
            ("scope_threshold", self.answer.scope_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be within 0.0-1.0, got {}", name, value)));
            }
        }
        if self.llm.embed_batch_size == 0 {
            return Err(Error::Config("embed_batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

/// `1`, `true`, `yes` (any case) count as true
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
