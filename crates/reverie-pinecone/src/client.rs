// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Pinecone data-plane API.
//!
//! A pure proxy: no cache, no retry state. Input metadata is already
//! scalar-typed; output metadata is sanitized so provider quirks surface as
//! absent fields, never synthetic values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reverie_core::types::sanitize_scalar_map;
use reverie_core::{IndexAdapter, QueryMatch, ReverieError, ScalarMap, VectorRecord};
use tracing::debug;

use crate::types::{render_filter, QueryRequest, QueryResponse, UpsertRequest, UpsertResponse, WireVector};

/// HTTP client for one Pinecone index's data plane.
#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: reqwest::Client,
    index_host: String,
}

impl PineconeClient {
    /// Creates a client for the index served at `index_host`
    /// (e.g. `https://lore-abc123.svc.pinecone.io`).
    pub fn new(api_key: &str, index_host: &str) -> Result<Self, ReverieError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| ReverieError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ReverieError::Store {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            index_host: index_host.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, ReverieError> {
        let url = format!("{}{path}", self.index_host);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ReverieError::Store {
                message: format!("request to {path} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(status = %status, path, "vector store response received");

        if !status.is_success() {
            return Err(ReverieError::Store {
                message: format!("vector store returned {status} for {path}: {text}"),
                source: None,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl IndexAdapter for PineconeClient {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, ReverieError> {
        if records.is_empty() {
            return Ok(0);
        }

        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| WireVector {
                    id: r.id.clone(),
                    values: r.embedding.clone(),
                    metadata: r.metadata.clone(),
                })
                .collect(),
        };

        let body = self.post_json("/vectors/upsert", &request).await?;
        let parsed: UpsertResponse =
            serde_json::from_str(&body).map_err(|e| ReverieError::Store {
                message: format!("unparseable upsert response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(parsed.upserted_count.unwrap_or(records.len()))
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&ScalarMap>,
    ) -> Result<Vec<QueryMatch>, ReverieError> {
        let request = QueryRequest {
            vector: vector.to_vec(),
            top_k,
            include_metadata: true,
            filter: filter.map(render_filter),
        };

        let body = self.post_json("/query", &request).await?;
        let parsed: QueryResponse =
            serde_json::from_str(&body).map_err(|e| ReverieError::Store {
                message: format!("unparseable query response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| QueryMatch {
                id: m.id,
                score: m.score,
                metadata: m
                    .metadata
                    .map(|v| sanitize_scalar_map(&v))
                    .unwrap_or_default(),
            })
            .collect())
    }
}
