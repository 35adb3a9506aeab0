// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. All clients are
//! constructed once at process start and handed in; handlers never build
//! or lazily initialize provider connections.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reverie_config::ReverieConfig;
use reverie_core::{GenerationAdapter, ReverieError};
use reverie_memory::{ArchiveStore, ConsistencyValidator, ConversationMemory, RetrievalComposer};
use tower_http::cors::CorsLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Loaded configuration (personas, history window, retrieval depths).
    pub config: Arc<ReverieConfig>,
    /// Lore archive ingest/search.
    pub archive: Arc<ArchiveStore>,
    /// Per-persona conversation memory.
    pub conversation: Arc<ConversationMemory>,
    /// Per-turn context composition.
    pub composer: Arc<RetrievalComposer>,
    /// Post-turn consistency validation.
    pub validator: Arc<ConsistencyValidator>,
    /// Streaming/non-streaming completion provider.
    pub generation: Arc<dyn GenerationAdapter>,
}

/// Gateway server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Builds the gateway router. Exposed separately from [`start_server`] so
/// tests can drive it in-process.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/chat", post(handlers::post_chat))
        .route("/v1/turns", post(handlers::post_turns))
        .route("/v1/archive", post(handlers::post_archive))
        .route("/v1/archive/query", post(handlers::post_archive_query))
        .route("/v1/validate", post(handlers::post_validate))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server and serve until shutdown.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), ReverieError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ReverieError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ReverieError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
