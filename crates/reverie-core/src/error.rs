// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Reverie persona memory engine.

use thiserror::Error;

/// The primary error type used across all Reverie adapters and memory operations.
#[derive(Debug, Error)]
pub enum ReverieError {
    /// Configuration errors (invalid chunking parameters, missing keys, bad TOML).
    /// Fatal: callers fail fast, no partial output.
    #[error("configuration error: {0}")]
    Config(String),

    /// The embedding provider returned no usable vector. Carries the provider's
    /// raw diagnostic payload when one was received.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        payload: Option<String>,
    },

    /// The vector store rejected an upsert or query. There is no partial-success
    /// contract: a rejected batch surfaces as a single error.
    #[error("vector store error: {message}")]
    Store {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Completion provider errors (API failure, malformed response, transport).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
