//! Document ingestion: read the input directory, chunk, embed, rebuild the index

mod chunker;
mod parser;

pub use chunker::TextChunker;
pub use parser::DocumentReader;

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::{normalize_path, LocalVectorStore};
use crate::types::document::{is_allowed_ext, ChunkMeta, FileType};

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Distinct documents in the new index
    pub documents: usize,
    /// Chunks embedded
    pub chunks: usize,
    /// Files that could not be read
    pub skipped: Vec<String>,
}

/// Allowed files directly inside `dir`, sorted by name
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if entry.file_type().is_file() && is_allowed_ext(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Split one file into chunk texts with their metadata
pub fn chunk_file(path: &Path, chunker: &TextChunker) -> Result<Vec<(String, ChunkMeta)>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path_str = normalize_path(&path.to_string_lossy());

    let mut out = Vec::new();
    match FileType::from_filename(&name) {
        Some(FileType::Pdf) => {
            let pages = DocumentReader::read_pdf_pages(path)?;
            let total = pages.len() as u32;
            for (page_no, page) in (1u32..).zip(&pages) {
                for (j, chunk) in chunker.split(page).into_iter().enumerate() {
                    let meta = ChunkMeta::pdf(&name, &path_str, page_no, j, total, &chunk);
                    out.push((chunk, meta));
                }
            }
        }
        Some(_) => {
            let text = DocumentReader::read_text(path)?;
            for (i, chunk) in chunker.split(&text).into_iter().enumerate() {
                let meta = ChunkMeta::text(&name, &path_str, i, &chunk);
                out.push((chunk, meta));
            }
        }
        None => return Err(Error::UnsupportedFileType(name)),
    }
    Ok(out)
}

/// Rebuilds the vector index from the input directory
pub struct Ingestor {
    pdf_dir: PathBuf,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: LocalVectorStore,
}

impl Ingestor {
    pub fn new(
        pdf_dir: impl Into<PathBuf>,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: LocalVectorStore,
    ) -> Self {
        Self {
            pdf_dir: pdf_dir.into(),
            chunker,
            embedder,
            store,
        }
    }

    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: LocalVectorStore,
    ) -> Self {
        Self::new(
            &config.paths.pdf_dir,
            TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            embedder,
            store,
        )
    }

    pub fn pdf_dir(&self) -> &Path {
        &self.pdf_dir
    }

    /// Read every allowed file in the input directory and replace the index.
    ///
    /// Files that fail to parse are skipped. When no chunks are produced the
    /// existing index is left untouched and zero documents are reported.
    pub async fn ingest_dir(&self) -> Result<IngestReport> {
        let started = Instant::now();
        tokio::fs::create_dir_all(&self.pdf_dir).await?;

        let dir = self.pdf_dir.clone();
        let chunker = self.chunker.clone();
        let (texts, metas, skipped) = tokio::task::spawn_blocking(move || {
            let mut texts = Vec::new();
            let mut metas = Vec::new();
            let mut skipped = Vec::new();

            for path in list_input_files(&dir)? {
                match chunk_file(&path, &chunker) {
                    Ok(chunks) => {
                        tracing::debug!("{}: {} chunks", path.display(), chunks.len());
                        for (text, meta) in chunks {
                            texts.push(text);
                            metas.push(meta);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", path.display(), e);
                        skipped.push(path.display().to_string());
                    }
                }
            }
            Ok::<_, Error>((texts, metas, skipped))
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        if texts.is_empty() {
            tracing::warn!(
                "No chunks found in {}, keeping the existing index",
                self.pdf_dir.display()
            );
            return Ok(IngestReport {
                documents: 0,
                chunks: 0,
                skipped,
            });
        }

        tracing::info!(
            "Embedding {} chunks with {} ({})",
            texts.len(),
            self.embedder.model(),
            self.embedder.name()
        );
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        let documents = metas.iter().map(|m| m.doc.as_str()).collect::<BTreeSet<_>>().len();
        let chunks = metas.len();
        self.store.save(vectors, metas).await?;

        tracing::info!(
            "Indexed {} documents ({} chunks) in {:?}",
            documents,
            chunks,
            started.elapsed()
        );
        Ok(IngestReport {
            documents,
            chunks,
            skipped,
        })
    }
}
