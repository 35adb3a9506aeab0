// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinecone data-plane request/response types.

use reverie_core::{ScalarMap, ScalarValue};
use serde::{Deserialize, Serialize};

/// Body of `POST /vectors/upsert`.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertRequest {
    pub vectors: Vec<WireVector>,
}

/// A vector as the data plane accepts it.
#[derive(Debug, Clone, Serialize)]
pub struct WireVector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ScalarMap,
}

/// Response of `POST /vectors/upsert`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    pub upserted_count: Option<usize>,
}

/// Body of `POST /query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    #[serde(rename = "topK")]
    pub top_k: usize,
    #[serde(rename = "includeMetadata")]
    pub include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
}

/// Response of `POST /query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<WireMatch>,
}

/// A match as the data plane returns it. Metadata is taken as raw JSON so
/// provider quirks never fail the whole query; normalization happens in the
/// client.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMatch {
    pub id: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Renders an exact-match conjunction filter in Pinecone's `$eq` form.
///
/// Every key must equal the given value; there is no OR, range, or
/// negation.
pub fn render_filter(filter: &ScalarMap) -> serde_json::Value {
    let mut clauses = serde_json::Map::new();
    for (key, value) in filter {
        let wire_value = match value {
            ScalarValue::Bool(b) => serde_json::Value::from(*b),
            ScalarValue::Integer(i) => serde_json::Value::from(*i),
            ScalarValue::Float(f) => serde_json::Value::from(*f),
            ScalarValue::Text(s) => serde_json::Value::from(s.as_str()),
        };
        clauses.insert(key.clone(), serde_json::json!({ "$eq": wire_value }));
    }
    serde_json::Value::Object(clauses)
}
