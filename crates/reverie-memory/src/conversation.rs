// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling conversation memory, partitioned by persona.
//!
//! Each completed turn becomes one vector record. The embedding is
//! computed over a labeled rendering of the question *and* the answer:
//! recall works by topical similarity to the new question, but the
//! rendering must still disambiguate which side was asked and which was
//! answered.

use std::sync::Arc;

use chrono::Utc;
use reverie_core::{
    ConversationHit, ConversationMetadata, EmbeddingAdapter, IndexAdapter, ReverieError,
    VectorRecord,
};
use tracing::{debug, warn};

/// The canonical text rendering a turn is embedded under.
pub fn render_turn(question: &str, answer: &str) -> String {
    format!("User asked: {question}\nYou answered: {answer}")
}

/// Write and recall access to per-persona conversation history.
pub struct ConversationMemory {
    embedder: Arc<dyn EmbeddingAdapter>,
    index: Arc<dyn IndexAdapter>,
}

impl ConversationMemory {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>, index: Arc<dyn IndexAdapter>) -> Self {
        Self { embedder, index }
    }

    /// Records one completed turn under `"conv-<persona>-<epoch_millis>"`.
    ///
    /// Two records for the same persona in the same millisecond collide;
    /// the later write wins. Accepted limitation, not silently handled.
    pub async fn record(
        &self,
        question: &str,
        answer: &str,
        persona: &str,
    ) -> Result<(), ReverieError> {
        let timestamp = Utc::now().timestamp_millis();
        let id = format!("conv-{persona}-{timestamp}");
        let text = render_turn(question, answer);
        let embedding = self.embedder.embed(&text).await?;

        let metadata = ConversationMetadata {
            role: persona.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp,
        };

        debug!(id = %id, persona, "recording conversation turn");
        self.index
            .upsert(&[VectorRecord::conversation(id, embedding, &text, &metadata)])
            .await?;
        Ok(())
    }

    /// Recalls the most relevant prior turns for a persona.
    ///
    /// The filter conjunction (`type = conversation`, `role = persona`)
    /// guarantees no other persona's records ever surface.
    pub async fn recall(
        &self,
        query: &str,
        persona: &str,
        top_k: usize,
    ) -> Result<Vec<ConversationHit>, ReverieError> {
        let vector = self.embedder.embed(query).await?;
        let filter = ConversationMetadata::recall_filter(persona);
        let matches = self.index.query(&vector, top_k, Some(&filter)).await?;

        Ok(matches
            .into_iter()
            .filter_map(|m| {
                let question = m.str_field("question").map(str::to_string);
                let answer = m.str_field("answer").map(str::to_string);
                match (question, answer) {
                    (Some(question), Some(answer)) => Some(ConversationHit {
                        score: m.score,
                        question,
                        answer,
                    }),
                    _ => {
                        warn!(id = %m.id, "conversation hit missing question/answer, skipping");
                        None
                    }
                }
            })
            .collect())
    }
}
