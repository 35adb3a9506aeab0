// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for the external embedding service.

use async_trait::async_trait;

use crate::error::ReverieError;

/// Converts text into a fixed-dimension vector via the external embedding
/// provider.
///
/// One provider call per invocation. The adapter performs no retries;
/// retry and pacing policy belong to the caller (batch ingestion
/// serializes calls with a delay, query-time callers do not).
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Embeds a single text, returning a vector of exactly
    /// [`dimension`](Self::dimension) floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ReverieError>;

    /// The fixed embedding dimension for the lifetime of the index.
    fn dimension(&self) -> usize;
}
