//! Indexed file listing

use axum::{extract::State, Extension, Json};

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::server::RequestTrace;
use crate::types::response::FilesResponse;

/// GET /api/files - Files present in the index
pub async fn list_files(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
) -> Result<Json<FilesResponse>, ApiError> {
    let has_index = state.store().exists();
    let files = if has_index {
        state
            .store()
            .list_indexed_files()
            .await
            .map_err(|e| ApiError::new(e, &trace.id))?
    } else {
        Vec::new()
    };

    Ok(Json(FilesResponse {
        ok: true,
        has_index,
        files,
        trace_id: trace.id,
    }))
}
