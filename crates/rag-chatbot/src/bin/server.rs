//! Chatbot server binary
//!
//! Run with: cargo run -p rag-chatbot --bin rag-chatbot-server

use rag_chatbot::{config::RagConfig, logging, server::RagServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                       RAG Chatbot                         ║
║      Subsidy Q&A over local documents and web search      ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Input directory: {}", config.paths.pdf_dir.display());
    tracing::info!("  - Index directory: {}", config.paths.index_dir.display());
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    if config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; ingestion and answers will fail (check .env)");
    }
    if config.search.api_key.is_none() {
        tracing::warn!("SERP_API_KEY is not set; web and hybrid modes will fail");
    }

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  UI: http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload - Upload documents");
    println!("  POST /api/ingest - Rebuild the index");
    println!("  POST /api/ask    - Ask questions");
    println!("  POST /api/reset  - Reset conversation");
    println!("  GET  /api/files  - List indexed files");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
