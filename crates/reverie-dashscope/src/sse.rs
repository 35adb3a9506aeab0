// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for DashScope streaming generation responses.
//!
//! Converts a reqwest response byte stream into a stream of incremental
//! text deltas using the `eventsource-stream` crate for SSE protocol
//! compliance. Decoding is best-effort: a malformed frame is skipped with
//! a debug log, never fatal to the stream.

use eventsource_stream::Eventsource;
use futures::stream::StreamExt;
use reverie_core::{ReverieError, TextDeltaStream};
use tracing::debug;

use crate::types::GenerationResponse;

/// Parses a streaming generation response into incremental text deltas.
///
/// Each SSE frame payload is a JSON object carrying the delta at
/// `output.text`. Frames without a parseable delta (keep-alives, malformed
/// payloads, terminal bookkeeping frames) are skipped. Transport errors
/// surface as stream items so the consumer can keep partial text.
pub fn parse_generation_stream(response: reqwest::Response) -> TextDeltaStream {
    let event_stream = response.bytes_stream().eventsource();

    Box::pin(event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::from_str::<GenerationResponse>(&event.data) {
                Ok(frame) => frame.output.and_then(|o| o.text).map(Ok),
                Err(e) => {
                    debug!(error = %e, data = %event.data, "skipping malformed stream frame");
                    None
                }
            },
            Err(e) => Some(Err(ReverieError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    }))
}
