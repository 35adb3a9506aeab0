// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index adapter trait for the external vector database.

use async_trait::async_trait;

use crate::error::ReverieError;
use crate::types::{QueryMatch, ScalarMap, VectorRecord};

/// Pure proxy to the external vector store: no cache, no retry state.
///
/// Namespacing is purely metadata-based; there is no physical index
/// separation between personas or record kinds.
#[async_trait]
pub trait IndexAdapter: Send + Sync {
    /// Upserts records, idempotent by id. Returns the number written.
    /// A rejected batch surfaces as one error; there is no partial success.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, ReverieError>;

    /// Top-K similarity query. `filter` is an exact-match conjunction over
    /// metadata fields. Tie order among equal scores is the provider's and
    /// must not be assumed stable across calls.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&ScalarMap>,
    ) -> Result<Vec<QueryMatch>, ReverieError>;
}
