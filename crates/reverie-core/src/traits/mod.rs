// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams to the external services.
//!
//! Clients are constructed once at process start and passed in by
//! reference; there are no lazy singletons.

pub mod embedding;
pub mod generation;
pub mod index;

pub use embedding::EmbeddingAdapter;
pub use generation::{GenerationAdapter, TextDeltaStream};
pub use index::IndexAdapter;
