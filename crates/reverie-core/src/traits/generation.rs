// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation adapter trait for the external chat-completion service.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ReverieError;
use crate::types::ChatMessage;

/// A stream of incremental text deltas from a streaming completion.
///
/// Malformed provider frames are already skipped upstream; items are
/// either clean deltas or transport errors.
pub type TextDeltaStream = Pin<Box<dyn Stream<Item = Result<String, ReverieError>> + Send>>;

/// The external chat-completion service, in streaming and non-streaming
/// modes.
#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    /// Non-streaming completion: one request, the full answer text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReverieError>;

    /// Streaming completion: incremental text deltas in arrival order.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<TextDeltaStream, ReverieError>;
}
