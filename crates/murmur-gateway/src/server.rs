// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state, and serves until the
//! shutdown token fires. The dispatcher classifies work by route: GET
//! routes borrow from the read pool, POST routes queue on the write
//! serializer. Storage draining happens after this server stops
//! accepting connections.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use murmur_core::MurmurError;
use murmur_storage::Database;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The single storage handle; all request work flows through it.
    pub db: Arc<Database>,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

/// Gateway server configuration (mirrors ServerConfig from murmur-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the full route table over the given state.
///
/// Exposed separately from [`start_server`] so tests can drive the router
/// without a listener.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/documents", post(handlers::post_document))
        .route("/v1/documents", get(handlers::list_documents))
        .route("/v1/documents/{id}", get(handlers::get_document))
        .route("/v1/documents/{id}/engage", post(handlers::engage_document))
        .route("/v1/stats", get(handlers::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` is cancelled.
///
/// Returns after in-flight HTTP connections finish; the caller then drains
/// storage. Bind failures surface before any request is accepted.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), MurmurError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MurmurError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| MurmurError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped accepting connections");
    Ok(())
}
