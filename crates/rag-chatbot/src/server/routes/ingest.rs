//! Index rebuild endpoint

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::json;
use std::time::Instant;

use crate::error::ApiError;
use crate::rag::trace::SCHEMA_VERSION;
use crate::server::state::AppState;
use crate::server::RequestTrace;
use crate::types::response::IngestResponse;

/// POST /api/ingest - Rebuild the index from the input directory
pub async fn ingest_dir(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
) -> Result<Json<IngestResponse>, ApiError> {
    let start = Instant::now();

    match state.ingest().await {
        Ok(report) => {
            tracing::info!(
                "Ingested {} documents ({} chunks, {} skipped) in {:.1}s",
                report.documents,
                report.chunks,
                report.skipped.len(),
                start.elapsed().as_secs_f64()
            );
            Ok(Json(IngestResponse {
                ok: true,
                indexed_docs: report.documents,
                trace_id: trace.id,
            }))
        }
        Err(e) => {
            let record = json!({
                "schema_version": SCHEMA_VERSION,
                "trace_id": trace.id,
                "error": e.to_string(),
                "where": "api_ingest",
            });
            tracing::error!(trace = %record, "ingest failed");
            Err(ApiError::new(e, &trace.id).with_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
