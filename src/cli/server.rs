//! HTTP server mode exposing the sample catalog as paged documents

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::sample::{catalog_page, catalog_stream, decode_continuation, sample_registry, SampleItem};
use crate::codec::PlanRegistry;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::http::{PagedBody, PagedJson};
use crate::types::JsonValue;

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    config: AppConfig,
    registry: PlanRegistry,
}

/// Query parameters of the catalog endpoints
#[derive(Debug, Default, Deserialize)]
struct ItemsQuery {
    /// Items per page
    page_size: Option<u32>,
    /// 1-based page number
    page: Option<u32>,
    /// Catalog size override
    count: Option<u64>,
    /// Token from a previous page; takes precedence over `page`
    continuation_token: Option<String>,
}

/// Build the router
pub fn router(config: AppConfig) -> Router {
    let state = AppState {
        config,
        registry: sample_registry(),
    };

    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/items", get(list_items))
        .route("/items/stream", get(stream_items))
        .route("/items/echo", post(echo_items))
        .layer(Extension(state.config.reader.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server and run until interrupted
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting HTTP server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// One page of the catalog with fixed pagination
async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemsQuery>,
) -> Response {
    let server = &state.config.server;
    let page_size = query.page_size.unwrap_or(server.default_page_size);
    if page_size == 0 {
        return error_response(StatusCode::BAD_REQUEST, "page_size must be greater than zero");
    }
    let total = query.count.unwrap_or(server.catalog_size);

    let offset = match (&query.continuation_token, query.page) {
        (Some(token), _) => match decode_continuation(token) {
            Ok(offset) => offset,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
        (None, Some(0)) => {
            return error_response(StatusCode::BAD_REQUEST, "page is 1-based");
        }
        (None, page) => u64::from(page.unwrap_or(1) - 1) * u64::from(page_size),
    };

    PagedJson::new(catalog_page(total, page_size, offset))
        .with_encoder(state.registry.encoder::<SampleItem>())
        .with_config(state.config.writer.clone())
        .with_channel_capacity(server.channel_capacity)
        .into_response()
}

/// The whole catalog with pagination written after the items
async fn stream_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemsQuery>,
) -> Response {
    let server = &state.config.server;
    let page_size = query.page_size.unwrap_or(server.default_page_size);
    let total = query.count.unwrap_or(server.catalog_size);

    PagedJson::new(catalog_stream(total, page_size, server.stream_strategy))
        .with_encoder(state.registry.encoder::<SampleItem>())
        .with_config(state.config.writer.clone().trailing())
        .with_channel_capacity(server.channel_capacity)
        .into_response()
}

/// Stream a posted paged document straight back
async fn echo_items(
    State(state): State<Arc<AppState>>,
    PagedBody(paged): PagedBody<JsonValue>,
) -> PagedJson<JsonValue> {
    PagedJson::new(paged)
        .with_config(state.config.writer.clone())
        .with_channel_capacity(state.config.server.channel_capacity)
}
