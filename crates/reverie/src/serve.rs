// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `reverie serve` command implementation.
//!
//! Builds the provider clients and the memory pipeline once, then runs
//! the gateway until shutdown.

use std::sync::Arc;

use reverie_config::ReverieConfig;
use reverie_core::{EmbeddingAdapter, GenerationAdapter, IndexAdapter, ReverieError};
use reverie_gateway::{start_server, GatewayState, ServerConfig};
use reverie_memory::{ConsistencyValidator, ConversationMemory, RetrievalComposer};
use tracing::info;

use crate::clients;

/// Runs the `reverie serve` command.
pub async fn run_serve(config: ReverieConfig) -> Result<(), ReverieError> {
    info!("starting reverie serve");

    let dashscope = clients::build_dashscope(&config)?;
    let pinecone = clients::build_pinecone(&config)?;

    let embedder: Arc<dyn EmbeddingAdapter> = dashscope.clone();
    let generation: Arc<dyn GenerationAdapter> = dashscope;
    let index: Arc<dyn IndexAdapter> = pinecone;

    let archive = Arc::new(clients::build_archive(&config, embedder.clone(), index.clone())?);
    let conversation = Arc::new(ConversationMemory::new(embedder, index));
    let composer = Arc::new(RetrievalComposer::new(
        archive.clone(),
        conversation.clone(),
        config.memory.archive_top_k,
        config.memory.recall_top_k,
    ));
    let validator = Arc::new(ConsistencyValidator::new(
        archive.clone(),
        generation.clone(),
        config.memory.validator_top_k,
    ));

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    let personas = config.personas.len();
    info!(personas, "memory pipeline ready");

    let state = GatewayState {
        config: Arc::new(config),
        archive,
        conversation,
        composer,
        validator,
        generation,
    };

    start_server(&server_config, state).await
}
