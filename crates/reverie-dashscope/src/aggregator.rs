// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript aggregation over an incremental delta stream.
//!
//! Accumulates deltas in arrival order into a single growing string. The
//! transcript is observable after every frame, and the accumulated text
//! stays valid when the stream ends abruptly; a partial answer is still
//! an answer. Substituting a sentinel for a fully empty transcript is the
//! caller's decision, not this component's.

use futures::StreamExt;
use reverie_core::TextDeltaStream;
use tracing::warn;

/// Push-driven accumulator for streamed text deltas.
#[derive(Debug, Default)]
pub struct StreamAggregator {
    transcript: String,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a delta and returns the transcript so far.
    pub fn push(&mut self, delta: &str) -> &str {
        self.transcript.push_str(delta);
        &self.transcript
    }

    /// The transcript accumulated so far.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// True when no text has accumulated.
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Consumes the aggregator, yielding the final transcript.
    pub fn finish(self) -> String {
        self.transcript
    }
}

/// Drains a delta stream to exhaustion and returns the final transcript.
///
/// A transport error ends accumulation early; whatever text arrived before
/// the error is returned as the (partial but valid) final transcript.
pub async fn aggregate(mut stream: TextDeltaStream) -> String {
    let mut aggregator = StreamAggregator::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(delta) => {
                aggregator.push(&delta);
            }
            Err(e) => {
                warn!(error = %e, "delta stream ended early, keeping partial transcript");
                break;
            }
        }
    }
    aggregator.finish()
}
