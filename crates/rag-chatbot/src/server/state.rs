//! Application state for the chatbot server

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::{IngestReport, Ingestor};
use crate::providers::Providers;
use crate::rag::RagEngine;
use crate::retrieval::{LocalVectorStore, VectorStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Vector index on disk
    store: LocalVectorStore,
    /// Answer pipeline
    engine: RagEngine,
    /// Rebuilds the index from the input directory
    ingestor: Ingestor,
    /// Held for the duration of an ingest run
    ingest_lock: Mutex<()>,
}

impl AppState {
    /// Create state backed by the HTTP providers
    pub fn new(config: RagConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Ok(Self::with_providers(config, providers))
    }

    /// Create state with the given providers
    pub fn with_providers(config: RagConfig, providers: Providers) -> Self {
        tracing::info!(
            "Initializing application state (index: {}, input: {})",
            config.paths.index_dir.display(),
            config.paths.pdf_dir.display()
        );

        let store = LocalVectorStore::new(Arc::new(VectorStore::new(&config.paths.index_dir)));
        let ingestor = Ingestor::from_config(&config, providers.embedder.clone(), store.clone());
        let engine = RagEngine::new(&config, providers, store.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                engine,
                ingestor,
                ingest_lock: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &LocalVectorStore {
        &self.inner.store
    }

    pub fn engine(&self) -> &RagEngine {
        &self.inner.engine
    }

    /// Rebuild the index; concurrent calls run one after another
    pub async fn ingest(&self) -> Result<IngestReport> {
        let _guard = self.inner.ingest_lock.lock().await;
        self.inner.ingestor.ingest_dir().await
    }
}
