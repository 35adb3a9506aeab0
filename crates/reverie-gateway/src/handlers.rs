// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! The chat endpoint streams SSE; everything else is plain JSON. A failed
//! chat turn yields the sentinel answer inside the stream rather than an
//! error response -- the persona falls silent, it does not crash.

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::{Stream, StreamExt};
use reverie_config::DEFAULT_PERSONA_ID;
use reverie_core::types::sanitize_scalar_map;
use reverie_core::{ArchiveHit, ChatMessage, ReverieError, Verdict, FALLBACK_ANSWER};
use reverie_dashscope::StreamAggregator;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::server::GatewayState;

/// Request body for POST /v1/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's new message.
    pub message: String,
    /// Persona id; unknown or absent ids fall back to the default persona.
    #[serde(default)]
    pub persona: Option<String>,
    /// Client-held transcript of earlier turns, oldest first.
    #[serde(default)]
    pub history: Vec<TurnItem>,
}

/// One prior question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnItem {
    pub question: String,
    pub answer: String,
}

/// Request body for POST /v1/turns.
#[derive(Debug, Deserialize)]
pub struct TurnSaveRequest {
    pub question: String,
    pub answer: String,
    pub persona_id: String,
}

/// Response body for POST /v1/turns.
#[derive(Debug, Serialize)]
pub struct TurnSaveResponse {
    pub success: bool,
}

/// Request body for POST /v1/archive.
#[derive(Debug, Deserialize)]
pub struct ArchiveIngestRequest {
    pub content: String,
    pub source_id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "character".to_string()
}

/// Response body for POST /v1/archive.
#[derive(Debug, Serialize)]
pub struct ArchiveIngestResponse {
    pub chunks: usize,
}

/// Request body for POST /v1/archive/query.
#[derive(Debug, Deserialize)]
pub struct ArchiveQueryRequest {
    pub query: String,
    /// Arbitrary JSON filter; non-scalar values are dropped.
    #[serde(default)]
    pub filter: Option<serde_json::Value>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Response body for POST /v1/archive/query.
#[derive(Debug, Serialize)]
pub struct ArchiveQueryResponse {
    pub results: Vec<ArchiveHit>,
}

/// Request body for POST /v1/validate.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub content: String,
    pub persona_id: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps an engine error onto an HTTP response, attaching the provider's
/// diagnostic payload where one exists.
fn error_response(err: &ReverieError) -> Response {
    let status = match err {
        ReverieError::Config(_) => StatusCode::BAD_REQUEST,
        ReverieError::Embedding { .. }
        | ReverieError::Store { .. }
        | ReverieError::Provider { .. } => StatusCode::BAD_GATEWAY,
        ReverieError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let error = match err {
        ReverieError::Embedding {
            payload: Some(payload),
            ..
        } => format!("{err}: {payload}"),
        _ => err.to_string(),
    };
    (status, Json(ErrorResponse { error })).into_response()
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /v1/chat
///
/// Streams the persona's answer as SSE: `delta` events carrying
/// incremental text, then a final `done` event with the full answer. The
/// conversation write and the consistency check run after the answer is
/// final and never block the stream.
pub async fn post_chat(
    State(state): State<GatewayState>,
    Json(body): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded::<Result<Event, Infallible>>();
    tokio::spawn(run_turn(state, body, tx));
    Sse::new(rx)
}

fn delta_event(text: &str) -> Event {
    Event::default()
        .event("delta")
        .data(serde_json::json!({ "text": text }).to_string())
}

fn done_event(text: &str) -> Event {
    Event::default()
        .event("done")
        .data(serde_json::json!({ "text": text }).to_string())
}

/// Drives one chat turn: compose context, stream the completion, forward
/// deltas, then finalize and spawn the post-turn side effects.
async fn run_turn(
    state: GatewayState,
    body: ChatRequest,
    tx: UnboundedSender<Result<Event, Infallible>>,
) {
    let requested = body.persona.as_deref().unwrap_or(DEFAULT_PERSONA_ID);
    let Some(persona) = state.config.persona(requested).cloned() else {
        // Unreachable with a validated config; fall silent rather than 500.
        let _ = tx.unbounded_send(Ok(done_event(FALLBACK_ANSWER)));
        return;
    };

    let mut system_prompt = persona.system_prompt.clone();
    if persona.retrieval {
        match state.composer.compose(&body.message, &persona.id).await {
            Ok(context) => system_prompt.push_str(&context),
            Err(e) => {
                warn!(error = %e, persona = %persona.id, "context composition failed");
                let _ = tx.unbounded_send(Ok(done_event(FALLBACK_ANSWER)));
                return;
            }
        }
    }

    let mut messages = Vec::with_capacity(body.history.len() * 2 + 2);
    messages.push(ChatMessage::system(system_prompt));
    let window = state.config.agent.history_window;
    let skip = body.history.len().saturating_sub(window);
    for item in &body.history[skip..] {
        messages.push(ChatMessage::user(item.question.clone()));
        messages.push(ChatMessage::assistant(item.answer.clone()));
    }
    messages.push(ChatMessage::user(body.message.clone()));

    let mut stream = match state.generation.stream(&messages).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, persona = %persona.id, "completion request failed");
            let _ = tx.unbounded_send(Ok(done_event(FALLBACK_ANSWER)));
            return;
        }
    };

    let mut aggregator = StreamAggregator::new();
    let mut client_gone = false;
    while let Some(item) = stream.next().await {
        match item {
            Ok(delta) => {
                aggregator.push(&delta);
                if tx.unbounded_send(Ok(delta_event(&delta))).is_err() {
                    client_gone = true;
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "upstream stream ended early, keeping partial answer");
                break;
            }
        }
    }

    let answer = aggregator.finish();
    let answer = if answer.is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        answer
    };
    let _ = tx.unbounded_send(Ok(done_event(&answer)));

    // An abandoned turn is not a completed turn; a sentinel is not an answer.
    if client_gone || !persona.retrieval || answer == FALLBACK_ANSWER {
        return;
    }

    let question = body.message;
    let persona_id = persona.id;
    {
        let conversation = state.conversation.clone();
        let question = question.clone();
        let answer = answer.clone();
        let persona_id = persona_id.clone();
        tokio::spawn(async move {
            if let Err(e) = conversation.record(&question, &answer, &persona_id).await {
                warn!(error = %e, persona = %persona_id, "failed to record conversation turn");
            }
        });
    }
    {
        let validator = state.validator.clone();
        tokio::spawn(async move {
            let verdict = validator.validate(&answer, &persona_id).await;
            match &verdict {
                Verdict::Judged {
                    has_conflict: true,
                    conflict_details,
                    ..
                } => {
                    warn!(persona = %persona_id, details = %conflict_details, "consistency check flagged a conflict");
                }
                _ => debug!(persona = %persona_id, "consistency check passed"),
            }
        });
    }
}

/// POST /v1/turns
///
/// Writes one completed turn into conversation memory. All three fields
/// are required and must be non-empty.
pub async fn post_turns(
    State(state): State<GatewayState>,
    Json(body): Json<TurnSaveRequest>,
) -> Response {
    if body.question.trim().is_empty()
        || body.answer.trim().is_empty()
        || body.persona_id.trim().is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "question, answer, and persona_id are required".to_string(),
            }),
        )
            .into_response();
    }

    match state
        .conversation
        .record(&body.question, &body.answer, &body.persona_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(TurnSaveResponse { success: true })).into_response(),
        Err(e) => {
            warn!(error = %e, "turn save failed");
            error_response(&e)
        }
    }
}

/// POST /v1/archive
///
/// Chunks, embeds, and upserts one lore document. Returns the number of
/// chunks written; a failed batch writes nothing and reports the
/// provider's diagnostic.
pub async fn post_archive(
    State(state): State<GatewayState>,
    Json(body): Json<ArchiveIngestRequest>,
) -> Response {
    if body.source_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "source_id is required".to_string(),
            }),
        )
            .into_response();
    }

    match state
        .archive
        .ingest(&body.content, &body.source_id, &body.kind)
        .await
    {
        Ok(chunks) => (StatusCode::OK, Json(ArchiveIngestResponse { chunks })).into_response(),
        Err(e) => {
            warn!(error = %e, source = %body.source_id, "archive ingest failed");
            error_response(&e)
        }
    }
}

/// POST /v1/archive/query
///
/// Ranked archive hits for a free-text query with an optional exact-match
/// filter.
pub async fn post_archive_query(
    State(state): State<GatewayState>,
    Json(body): Json<ArchiveQueryRequest>,
) -> Response {
    let filter = body.filter.as_ref().map(sanitize_scalar_map);
    let top_k = body.top_k.unwrap_or(state.config.memory.archive_top_k);

    match state.archive.query(&body.query, top_k, filter.as_ref()).await {
        Ok(results) => (StatusCode::OK, Json(ArchiveQueryResponse { results })).into_response(),
        Err(e) => {
            warn!(error = %e, "archive query failed");
            error_response(&e)
        }
    }
}

/// POST /v1/validate
///
/// Judges content against a persona's archived lore. Always returns a
/// verdict; degraded verdicts are 200s, not errors.
pub async fn post_validate(
    State(state): State<GatewayState>,
    Json(body): Json<ValidateRequest>,
) -> Json<Verdict> {
    Json(state.validator.validate(&body.content, &body.persona_id).await)
}
