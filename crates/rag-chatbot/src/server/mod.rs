//! HTTP server for the chatbot

pub mod routes;
pub mod state;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::logging::new_trace_id;
use state::AppState;

pub const TRACE_ID_HEADER: &str = "x-trace-id";
pub const RTT_HEADER: &str = "x-rtt-ms";

/// Per-request trace id, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct RequestTrace {
    pub id: String,
    pub started: Instant,
}

/// Chatbot HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server with the HTTP-backed providers
    pub fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        router(self.state.clone())
    }

    /// Start the server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting chatbot server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        self.config.bind_address()
    }
}

/// The full application router for `state`
pub fn router(state: AppState) -> Router {
    let enable_cors = state.config().server.enable_cors;
    let max_upload_size = state.config().server.max_upload_size;

    let mut app = Router::new()
        .route("/", get(routes::index::index_page))
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes(max_upload_size))
        .with_state(state)
        // Middleware layers (order matters - applied bottom to top)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([
                HeaderName::from_static(TRACE_ID_HEADER),
                HeaderName::from_static(RTT_HEADER),
            ]);
        app = app.layer(cors);
    }

    app.layer(middleware::from_fn(request_trace))
}

/// Assign a trace id and report the round-trip time on the response
async fn request_trace(mut request: Request, next: Next) -> Response {
    let trace = RequestTrace {
        id: new_trace_id(),
        started: Instant::now(),
    };
    request.extensions_mut().insert(trace.clone());

    let mut response = next.run(request).await;
    let rtt_ms = trace.started.elapsed().as_millis();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&trace.id) {
        headers.insert(TRACE_ID_HEADER, value);
    }
    headers.insert(RTT_HEADER, HeaderValue::from(rtt_ms as u64));
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
