//! One-shot index build
//!
//! Run with: cargo run -p rag-chatbot --bin rag-chatbot-ingest

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use rag_chatbot::{
    config::RagConfig,
    ingestion::Ingestor,
    logging,
    providers::Providers,
    retrieval::{LocalVectorStore, VectorStore},
};

#[derive(Parser)]
#[command(name = "rag-chatbot-ingest")]
#[command(about = "Build the vector index from the input directory")]
struct Args {
    /// Directory with the PDF/text files to index
    #[arg(long)]
    pdf_dir: Option<PathBuf>,

    /// Directory the index is written to
    #[arg(long)]
    index_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = RagConfig::load()?;
    if let Some(dir) = args.pdf_dir {
        config.paths.pdf_dir = dir;
    }
    if let Some(dir) = args.index_dir {
        config.paths.index_dir = dir;
    }

    tracing::info!(
        "Indexing {} into {}",
        config.paths.pdf_dir.display(),
        config.paths.index_dir.display()
    );

    let providers = Providers::from_config(&config)?;
    let store = LocalVectorStore::new(Arc::new(VectorStore::new(&config.paths.index_dir)));
    let ingestor = Ingestor::from_config(&config, providers.embedder, store);

    let report = ingestor.ingest_dir().await?;
    for name in &report.skipped {
        tracing::warn!("Skipped {}", name);
    }

    println!("indexed docs: {}", report.documents);
    Ok(())
}
