//! Core types for the chatbot

pub mod document;
pub mod hit;
pub mod query;
pub mod response;

pub use document::{ChunkMeta, FileType};
pub use hit::{DocHit, WebHit};
pub use query::{AskRequest, Flag, SearchMode};
pub use response::{AskResponse, IndexedFile, Source, SourceKind};
