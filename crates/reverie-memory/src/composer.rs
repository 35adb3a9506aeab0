// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context composition from the two memory sources.
//!
//! Archive search and conversation recall are independently scored and
//! independently tuned; keeping them separate preserves the boundary
//! between facts about the world and facts about this conversation. The
//! two reads run concurrently and the composer waits for both.

use std::sync::Arc;

use reverie_core::{ArchiveHit, ConversationHit, ReverieError};

use crate::archive::ArchiveStore;
use crate::conversation::ConversationMemory;

/// Section label preceding archive hits.
const ARCHIVE_LABEL: &str = "[Relevant memory archive]";

/// Section label preceding recalled turns.
const HISTORY_LABEL: &str = "[Historical dialogue memory]";

/// Closing instruction appended whenever any memory section is present.
const GROUNDING_INSTRUCTION: &str =
    "Ground your answer in the memories above and stay consistent with your persona.";

/// Builds the per-turn context block appended to a persona's system
/// instructions.
pub struct RetrievalComposer {
    archive: Arc<ArchiveStore>,
    conversation: Arc<ConversationMemory>,
    archive_top_k: usize,
    recall_top_k: usize,
}

impl RetrievalComposer {
    pub fn new(
        archive: Arc<ArchiveStore>,
        conversation: Arc<ConversationMemory>,
        archive_top_k: usize,
        recall_top_k: usize,
    ) -> Self {
        Self {
            archive,
            conversation,
            archive_top_k,
            recall_top_k,
        }
    }

    /// Composes the context block for one turn.
    ///
    /// Returns an empty string when both sources come back empty; the
    /// caller proceeds with the bare persona prompt.
    pub async fn compose(&self, query: &str, persona: &str) -> Result<String, ReverieError> {
        let (archive_hits, recall_hits) = tokio::join!(
            self.archive.search(query, persona, self.archive_top_k),
            self.conversation.recall(query, persona, self.recall_top_k),
        );
        Ok(render_context(&archive_hits?, &recall_hits?))
    }
}

/// Renders the context block from already-fetched hits.
fn render_context(archive_hits: &[ArchiveHit], recall_hits: &[ConversationHit]) -> String {
    let mut block = String::new();

    if !archive_hits.is_empty() {
        let texts: Vec<&str> = archive_hits.iter().map(|h| h.text.as_str()).collect();
        block.push_str(&format!("\n\n{ARCHIVE_LABEL}\n{}", texts.join("\n\n")));
    }

    if !recall_hits.is_empty() {
        let turns: Vec<String> = recall_hits
            .iter()
            .map(|h| format!("The user once asked: {}\nYou once answered: {}", h.question, h.answer))
            .collect();
        block.push_str(&format!("\n\n{HISTORY_LABEL}\n{}", turns.join("\n\n")));
    }

    if !block.is_empty() {
        block.push_str(&format!("\n\n{GROUNDING_INSTRUCTION}"));
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_core::ScalarMap;

    fn archive_hit(text: &str) -> ArchiveHit {
        ArchiveHit {
            score: Some(0.9),
            text: text.into(),
            metadata: ScalarMap::new(),
        }
    }

    fn recall_hit(question: &str, answer: &str) -> ConversationHit {
        ConversationHit {
            score: Some(0.8),
            question: question.into(),
            answer: answer.into(),
        }
    }

    #[test]
    fn both_sources_empty_yields_empty_block() {
        assert_eq!(render_context(&[], &[]), "");
    }

    #[test]
    fn archive_only_block_has_archive_section_and_instruction() {
        let block = render_context(&[archive_hit("the shrine is east")], &[]);
        assert!(block.contains(ARCHIVE_LABEL));
        assert!(block.contains("the shrine is east"));
        assert!(!block.contains(HISTORY_LABEL));
        assert!(block.contains(GROUNDING_INSTRUCTION));
    }

    #[test]
    fn history_only_block_has_history_section_and_instruction() {
        let block = render_context(&[], &[recall_hit("where?", "east")]);
        assert!(!block.contains(ARCHIVE_LABEL));
        assert!(block.contains(HISTORY_LABEL));
        assert!(block.contains("The user once asked: where?"));
        assert!(block.contains("You once answered: east"));
        assert!(block.contains(GROUNDING_INSTRUCTION));
    }

    #[test]
    fn archive_hits_keep_store_order() {
        let block = render_context(&[archive_hit("first"), archive_hit("second")], &[]);
        let first = block.find("first").unwrap();
        let second = block.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn full_block_orders_archive_before_history() {
        let block = render_context(
            &[archive_hit("lore fact")],
            &[recall_hit("a question", "an answer")],
        );
        let archive_at = block.find(ARCHIVE_LABEL).unwrap();
        let history_at = block.find(HISTORY_LABEL).unwrap();
        let instruction_at = block.find(GROUNDING_INSTRUCTION).unwrap();
        assert!(archive_at < history_at);
        assert!(history_at < instruction_at);
    }

    mod end_to_end {
        use super::*;
        use crate::archive::ArchiveStore;
        use crate::chunker::{Chunker, ChunkerConfig};
        use crate::conversation::ConversationMemory;
        use crate::testing::{MemoryIndex, MockEmbedder};
        use reverie_core::IndexAdapter;
        use std::sync::Arc;
        use std::time::Duration;

        fn composer(index: Arc<MemoryIndex>) -> (RetrievalComposer, Arc<ConversationMemory>) {
            let embedder = Arc::new(MockEmbedder::new(4));
            let archive = Arc::new(ArchiveStore::new(
                embedder.clone(),
                index.clone(),
                Chunker::new(ChunkerConfig::default()).unwrap(),
                Duration::from_millis(0),
            ));
            let conversation = Arc::new(ConversationMemory::new(embedder, index));
            (
                RetrievalComposer::new(archive.clone(), conversation.clone(), 3, 3),
                conversation,
            )
        }

        #[tokio::test]
        async fn empty_store_composes_empty_block() {
            let (composer, _) = composer(Arc::new(MemoryIndex::new()));
            let block = composer.compose("anything", "mira").await.unwrap();
            assert!(block.is_empty());
        }

        #[tokio::test]
        async fn populated_store_composes_both_sections() {
            let index = Arc::new(MemoryIndex::new());
            let (composer, conversation) = composer(index.clone());

            let embedder = MockEmbedder::new(4);
            let meta = reverie_core::ArchiveMetadata {
                persona: "mira".into(),
                kind: "character".into(),
                extra: ScalarMap::new(),
            };
            index
                .upsert(&[reverie_core::VectorRecord::archive(
                    "mira-0".into(),
                    embedder.vector_for("Mira guards the river shrine."),
                    "Mira guards the river shrine.",
                    &meta,
                )])
                .await
                .unwrap();
            conversation
                .record("where is it?", "east of the falls", "mira")
                .await
                .unwrap();

            let block = composer.compose("tell me about the shrine", "mira").await.unwrap();
            assert!(block.contains(ARCHIVE_LABEL));
            assert!(block.contains(HISTORY_LABEL));
            assert!(block.contains(GROUNDING_INSTRUCTION));
        }
    }
}
