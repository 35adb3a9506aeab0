// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contextual memory and retrieval for the Reverie persona engine.
//!
//! Ingestion path: [`chunker::Chunker`] → embedding → index upsert via
//! [`archive::ArchiveStore`]. Query path: [`composer::RetrievalComposer`]
//! fuses archive search and [`conversation::ConversationMemory`] recall
//! into one context block. After a turn,
//! [`validator::ConsistencyValidator`] judges the answer against the
//! archive, advisory-only.

pub mod archive;
pub mod chunker;
pub mod composer;
pub mod conversation;
pub mod validator;

pub use archive::ArchiveStore;
pub use chunker::{Chunker, ChunkerConfig};
pub use composer::RetrievalComposer;
pub use conversation::{render_turn, ConversationMemory};
pub use validator::ConsistencyValidator;
