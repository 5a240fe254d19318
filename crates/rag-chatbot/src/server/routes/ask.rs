//! Question answering endpoint

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Extension, Form, Json,
};
use serde_json::json;

use crate::error::ApiError;
use crate::rag::trace::SCHEMA_VERSION;
use crate::server::state::AppState;
use crate::server::RequestTrace;
use crate::types::{AskRequest, AskResponse, Flag};

/// Fill the ask fields from multipart text parts, ignoring anything else
async fn ask_from_multipart(mut multipart: Multipart) -> Result<AskRequest, String> {
    let mut request = AskRequest::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            continue;
        }
        match name.as_str() {
            "query" => request.query = Some(field.text().await.map_err(|e| e.to_string())?),
            "mode" => request.mode = Some(field.text().await.map_err(|e| e.to_string())?),
            "debug" => {
                request.debug = Some(Flag::Text(field.text().await.map_err(|e| e.to_string())?))
            }
            _ => {}
        }
    }
    Ok(request)
}

/// Ask body read as JSON, multipart or urlencoded form fields, depending on the content type
#[derive(Debug)]
pub struct AskBody(pub AskRequest);

#[async_trait]
impl<S> FromRequest<S> for AskBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let trace_id = req
            .extensions()
            .get::<RequestTrace>()
            .map(|t| t.id.clone())
            .unwrap_or_default();
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text(), &trace_id))?;
            let body = ask_from_multipart(multipart)
                .await
                .map_err(|e| ApiError::bad_request(e, &trace_id))?;
            Ok(Self(body))
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<AskRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text(), &trace_id))?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<AskRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text(), &trace_id))?;
            Ok(Self(body))
        }
    }
}

/// POST /api/ask - Answer a question from documents and/or the web
pub async fn ask(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    AskBody(request): AskBody,
) -> Result<Json<AskResponse>, ApiError> {
    let ask = request
        .validate()
        .map_err(|rejection| ApiError::bad_request(rejection.message(), &trace.id))?;

    tracing::info!("Ask ({}): \"{}\"", ask.mode, ask.query);

    match state
        .engine()
        .answer(&ask.query, ask.mode, ask.debug, &trace.id)
        .await
    {
        Ok(payload) => Ok(Json(AskResponse {
            ok: true,
            answer: payload.answer,
            sources: payload.sources,
            trace: payload.trace,
            mode: ask.mode.to_string(),
            trace_id: trace.id,
        })),
        Err(e) => {
            let record = json!({
                "schema_version": SCHEMA_VERSION,
                "trace_id": trace.id,
                "error": e.to_string(),
                "where": "api_ask",
            });
            tracing::error!(trace = %record, "ask failed");
            Err(ApiError::new(e, &trace.id).with_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
