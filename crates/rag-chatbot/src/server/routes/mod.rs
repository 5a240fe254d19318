//! API routes for the chatbot server

pub mod ask;
pub mod files;
pub mod index;
pub mod ingest;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;

use crate::server::state::AppState;
use crate::server::RequestTrace;
use crate::types::response::ResetResponse;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Uploads - with larger body limit for files
        .route(
            "/upload",
            post(upload::upload_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/ingest", post(ingest::ingest_dir))
        .route("/ask", post(ask::ask))
        .route("/reset", post(reset))
        .route("/files", get(files::list_files))
        .route("/info", get(info))
}

/// POST /api/reset - The server keeps no conversation state
async fn reset(Extension(trace): Extension<RequestTrace>) -> Json<ResetResponse> {
    Json(ResetResponse {
        ok: true,
        message: "reset done".to_string(),
        trace_id: trace.id,
    })
}

/// API info endpoint
async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented chatbot over local documents and web search",
        "endpoints": {
            "GET /": "Index page with the indexed file list",
            "POST /api/upload": "Upload files into the input directory (multipart field `files`)",
            "POST /api/ingest": "Rebuild the index from the input directory",
            "POST /api/ask": "Ask a question (query, mode = doc|web|hybrid, debug)",
            "POST /api/reset": "Reset conversation state",
            "GET /api/files": "List indexed files",
            "GET /health": "Health check"
        }
    }))
}
