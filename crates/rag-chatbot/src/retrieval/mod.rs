//! Vector index storage and similarity search

mod flat;
mod store;

pub use flat::{normalize, FlatIndex, MAGIC};
pub use store::{normalize_path, LocalVectorStore, VectorStore, INDEX_FILE, META_FILE};
