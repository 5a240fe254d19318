//! rag-chatbot: retrieval-augmented question answering over local documents and the web
//!
//! Documents dropped into the input directory (PDF, plain text, Markdown) are split
//! into overlapping chunks, embedded, and stored in a flat inner-product index.
//! Questions are scope-checked, answered from document and/or web context by an
//! LLM, and validated before they are returned together with their sources.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod providers;
pub mod rag;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{ChunkMeta, FileType},
    query::{AskRequest, SearchMode},
    response::{AskResponse, Source},
};
