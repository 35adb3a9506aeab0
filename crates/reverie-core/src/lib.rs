// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Reverie persona memory engine.
//!
//! Provides the error type, the domain types for chunks, vector records,
//! retrieval hits, and verdicts, and the adapter traits implemented by the
//! provider crates.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ReverieError;
pub use traits::{EmbeddingAdapter, GenerationAdapter, IndexAdapter, TextDeltaStream};
pub use types::{
    ArchiveHit, ArchiveMetadata, Chunk, ChatMessage, ChatRole, ConversationHit,
    ConversationMetadata, QueryMatch, ScalarMap, ScalarValue, Verdict, VectorRecord,
    FALLBACK_ANSWER, TEXT_KEY,
};
