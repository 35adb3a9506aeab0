// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DashScope provider adapter for the Reverie persona memory engine.
//!
//! Implements [`reverie_core::EmbeddingAdapter`] and
//! [`reverie_core::GenerationAdapter`] against the DashScope HTTP API, plus
//! the SSE parsing and transcript aggregation used by streaming turns.

pub mod aggregator;
pub mod client;
pub mod sse;
pub mod types;

pub use aggregator::{aggregate, StreamAggregator};
pub use client::{DashScopeClient, DashScopeOptions};
