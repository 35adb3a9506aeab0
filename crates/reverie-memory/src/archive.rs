// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lore archive ingestion and retrieval.
//!
//! Ingestion is deliberately sequential: one embedding call at a time with
//! a fixed delay between calls, trading throughput for provider rate-limit
//! safety. An embedding failure aborts the remaining items rather than
//! upserting partial or garbage vectors; nothing reaches the store for
//! that batch.

use std::sync::Arc;
use std::time::Duration;

use reverie_core::{
    ArchiveHit, ArchiveMetadata, EmbeddingAdapter, IndexAdapter, ReverieError, ScalarMap,
    VectorRecord,
};
use tracing::{debug, warn};

use crate::chunker::Chunker;

/// Write and read access to the persona lore archive.
pub struct ArchiveStore {
    embedder: Arc<dyn EmbeddingAdapter>,
    index: Arc<dyn IndexAdapter>,
    chunker: Chunker,
    embed_delay: Duration,
}

impl ArchiveStore {
    pub fn new(
        embedder: Arc<dyn EmbeddingAdapter>,
        index: Arc<dyn IndexAdapter>,
        chunker: Chunker,
        embed_delay: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            embed_delay,
        }
    }

    /// Chunks, embeds, and upserts one source document. Returns the number
    /// of vectors written.
    ///
    /// Chunk ids are derived from `source_id`, so re-ingesting the same
    /// source overwrites its previous vectors in place.
    pub async fn ingest(
        &self,
        content: &str,
        source_id: &str,
        kind: &str,
    ) -> Result<usize, ReverieError> {
        let metadata = ArchiveMetadata {
            persona: source_id.to_string(),
            kind: kind.to_string(),
            extra: ScalarMap::new(),
        };
        let chunks = self.chunker.split(content, &metadata);
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut records = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.embed_delay).await;
            }
            debug!(chunk = %chunk.id, index = i, total = chunks.len(), "embedding chunk");
            let embedding = self.embedder.embed(&chunk.text).await?;
            records.push(VectorRecord::archive(
                chunk.id.clone(),
                embedding,
                &chunk.text,
                &chunk.metadata,
            ));
        }

        self.index.upsert(&records).await
    }

    /// Top-K archive search scoped to one persona's namespace.
    pub async fn search(
        &self,
        query: &str,
        persona: &str,
        top_k: usize,
    ) -> Result<Vec<ArchiveHit>, ReverieError> {
        let filter = ArchiveMetadata::persona_filter(persona);
        self.query(query, top_k, Some(&filter)).await
    }

    /// Top-K archive search with an arbitrary exact-match filter.
    pub async fn query(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&ScalarMap>,
    ) -> Result<Vec<ArchiveHit>, ReverieError> {
        let vector = self.embedder.embed(query).await?;
        let matches = self.index.query(&vector, top_k, filter).await?;

        Ok(matches
            .into_iter()
            .filter_map(|m| {
                let text = m.text().map(str::to_string);
                match text {
                    Some(text) => Some(ArchiveHit {
                        score: m.score,
                        text,
                        metadata: m.metadata,
                    }),
                    None => {
                        warn!(id = %m.id, "archive hit has no stored text, skipping");
                        None
                    }
                }
            })
            .collect())
    }
}
