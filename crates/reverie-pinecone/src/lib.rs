// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinecone vector index adapter for the Reverie persona memory engine.
//!
//! Implements [`reverie_core::IndexAdapter`] against the Pinecone
//! data-plane REST API. Persona and record-kind namespacing is purely
//! metadata-based; the index itself is shared.

pub mod client;
pub mod types;

pub use client::PineconeClient;
