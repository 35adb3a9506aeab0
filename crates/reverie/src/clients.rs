// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider client construction from configuration.
//!
//! Clients are built once per process and shared by reference; there are
//! no lazy singletons. Missing credentials fail here, at startup, with a
//! message naming the environment variable to set.

use std::sync::Arc;
use std::time::Duration;

use reverie_config::ReverieConfig;
use reverie_core::{EmbeddingAdapter, IndexAdapter, ReverieError};
use reverie_dashscope::{DashScopeClient, DashScopeOptions};
use reverie_memory::{ArchiveStore, Chunker, ChunkerConfig};
use reverie_pinecone::PineconeClient;

/// Builds the DashScope client (embeddings + generation).
pub fn build_dashscope(config: &ReverieConfig) -> Result<Arc<DashScopeClient>, ReverieError> {
    let api_key = config.dashscope.api_key.as_deref().ok_or_else(|| {
        ReverieError::Config(
            "dashscope.api_key is not configured (set REVERIE_DASHSCOPE_API_KEY)".into(),
        )
    })?;

    let client = DashScopeClient::new(
        api_key,
        DashScopeOptions {
            base_url: config.dashscope.base_url.clone(),
            embedding_model: config.dashscope.embedding_model.clone(),
            embedding_dimension: config.dashscope.embedding_dimension,
            generation_model: config.dashscope.generation_model.clone(),
        },
    )?;
    Ok(Arc::new(client))
}

/// Builds the Pinecone index client.
pub fn build_pinecone(config: &ReverieConfig) -> Result<Arc<PineconeClient>, ReverieError> {
    let api_key = config.pinecone.api_key.as_deref().ok_or_else(|| {
        ReverieError::Config(
            "pinecone.api_key is not configured (set REVERIE_PINECONE_API_KEY)".into(),
        )
    })?;
    let index_host = config.pinecone.index_host.as_deref().ok_or_else(|| {
        ReverieError::Config(
            "pinecone.index_host is not configured (set REVERIE_PINECONE_INDEX_HOST)".into(),
        )
    })?;

    Ok(Arc::new(PineconeClient::new(api_key, index_host)?))
}

/// Builds the archive store over already-constructed adapters.
pub fn build_archive(
    config: &ReverieConfig,
    embedder: Arc<dyn EmbeddingAdapter>,
    index: Arc<dyn IndexAdapter>,
) -> Result<ArchiveStore, ReverieError> {
    let chunker = Chunker::new(ChunkerConfig {
        chunk_size: config.memory.chunk_size,
        chunk_overlap: config.memory.chunk_overlap,
    })?;
    Ok(ArchiveStore::new(
        embedder,
        index,
        chunker,
        Duration::from_millis(config.memory.embed_delay_ms),
    ))
}
