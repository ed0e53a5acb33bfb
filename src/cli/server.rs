//! HTTP server mode for the connector builder

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::builder::handle_request;
use crate::error::{Error, Result};
use crate::protocol::ConfiguredCatalog;

/// Server configuration
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Request body for the builder endpoint
#[derive(Debug, Deserialize)]
struct BuilderPayload {
    /// Request config carrying the command and manifest
    config: Value,
    /// Catalog for `test_read`
    #[serde(default)]
    catalog: Option<ConfiguredCatalog>,
}

/// Error body
#[derive(Debug, Serialize)]
struct ApiError {
    success: bool,
    error: String,
}

impl ApiError {
    fn response(status: StatusCode, error: &Error) -> Response {
        (
            status,
            Json(Self {
                success: false,
                error: error.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the router
pub fn app() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/builder", post(builder))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {}: {e}", config.port)))?;

    axum::serve(listener, app())
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Run one builder command
async fn builder(Json(payload): Json<BuilderPayload>) -> Response {
    match handle_request(payload.config, payload.catalog).await {
        Ok(message) => (StatusCode::OK, Json(message)).into_response(),
        Err(e) if e.is_invocation_error() => ApiError::response(StatusCode::BAD_REQUEST, &e),
        Err(e) => {
            warn!(error = %e, "Builder request failed");
            ApiError::response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}
