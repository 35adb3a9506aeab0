// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-generation consistency validation against the lore archive.
//!
//! The validator is an advisory overlay, not a gate: it never fails the
//! user-visible turn. Every internal failure collapses into a degraded
//! no-conflict verdict. With zero relevant facts it short-circuits before
//! the completion call.

use std::sync::Arc;

use reverie_core::{ArchiveHit, ChatMessage, GenerationAdapter, Verdict};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::archive::ArchiveStore;

/// Degraded message when the persona has no archived lore.
const NO_FACTS_MESSAGE: &str = "no archived lore to check against";

/// Degraded message when judging or extraction failed.
const FAILED_MESSAGE: &str = "validation failed";

/// Judges generated answers against retrieved archive facts.
pub struct ConsistencyValidator {
    archive: Arc<ArchiveStore>,
    generation: Arc<dyn GenerationAdapter>,
    top_k: usize,
}

impl ConsistencyValidator {
    pub fn new(
        archive: Arc<ArchiveStore>,
        generation: Arc<dyn GenerationAdapter>,
        top_k: usize,
    ) -> Self {
        Self {
            archive,
            generation,
            top_k,
        }
    }

    /// Produces a verdict for one generated answer. Infallible by design.
    pub async fn validate(&self, generated: &str, persona: &str) -> Verdict {
        let facts = match self.archive.search(generated, persona, self.top_k).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, persona, "archive lookup failed during validation");
                return Verdict::degraded(FAILED_MESSAGE);
            }
        };

        if facts.is_empty() {
            debug!(persona, "no archive facts, skipping judge call");
            return Verdict::degraded(NO_FACTS_MESSAGE);
        }

        let messages = [
            ChatMessage::system(
                "You are a lore consistency reviewer. Reply with a single JSON object and nothing else.",
            ),
            ChatMessage::user(judge_prompt(&facts, generated)),
        ];

        let raw = match self.generation.complete(&messages).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, persona, "judge call failed during validation");
                return Verdict::degraded(FAILED_MESSAGE);
            }
        };

        parse_verdict(&raw).unwrap_or_else(|| {
            warn!(persona, "no parseable verdict in judge response");
            Verdict::degraded(FAILED_MESSAGE)
        })
    }
}

/// Builds the judge prompt embedding the retrieved facts and the text
/// under review.
fn judge_prompt(facts: &[ArchiveHit], generated: &str) -> String {
    let fact_block: Vec<&str> = facts.iter().map(|f| f.text.as_str()).collect();
    format!(
        "Judge whether the generated reply below conflicts with the canonical lore.\n\n\
         [Canonical lore]\n{}\n\n\
         [Reply under review]\n{}\n\n\
         Reply with exactly this JSON shape and nothing else:\n\
         {{\n\
           \"hasConflict\": true or false,\n\
           \"conflictDetails\": \"what conflicts, or 'none'\",\n\
           \"suggestion\": \"how to fix it, or 'none'\"\n\
         }}",
        fact_block.join("\n\n"),
        generated
    )
}

/// Lenient judge-output shape: optional fields default so a terse but
/// well-meaning reply still counts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JudgeOutput {
    has_conflict: bool,
    #[serde(default)]
    conflict_details: String,
    #[serde(default)]
    suggestion: String,
}

/// Extracts and parses the first balanced JSON object in free-form text.
fn parse_verdict(raw: &str) -> Option<Verdict> {
    let region = extract_json_object(raw)?;
    let parsed: JudgeOutput = serde_json::from_str(region).ok()?;
    Some(Verdict::Judged {
        has_conflict: parsed.has_conflict,
        conflict_details: parsed.conflict_details,
        suggestion: parsed.suggestion,
    })
}

/// Finds the first balanced `{...}` region, tracking string literals and
/// escapes so braces inside string values never mis-bound the match.
fn extract_json_object(text: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if start.is_none() {
            if c == '{' {
                start = Some(i);
                depth = 1;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveStore;
    use crate::chunker::{Chunker, ChunkerConfig};
    use crate::testing::{MemoryIndex, MockEmbedder, ScriptedGeneration};
    use reverie_core::ReverieError;
    use std::sync::Arc;
    use std::time::Duration;

    fn validator(
        index: Arc<MemoryIndex>,
        generation: Arc<ScriptedGeneration>,
    ) -> ConsistencyValidator {
        let archive = Arc::new(ArchiveStore::new(
            Arc::new(MockEmbedder::new(4)),
            index,
            Chunker::new(ChunkerConfig::default()).unwrap(),
            Duration::from_millis(0),
        ));
        ConsistencyValidator::new(archive, generation, 5)
    }

    async fn seeded_index() -> Arc<MemoryIndex> {
        let index = Arc::new(MemoryIndex::new());
        let archive = ArchiveStore::new(
            Arc::new(MockEmbedder::new(4)),
            index.clone(),
            Chunker::new(ChunkerConfig::default()).unwrap(),
            Duration::from_millis(0),
        );
        archive
            .ingest("The river shrine stands east of the falls.", "mira", "character")
            .await
            .unwrap();
        index
    }

    #[test]
    fn extracts_object_from_surrounding_prose() {
        let raw = "Sure! Here is the verdict: {\"hasConflict\": false} -- hope that helps.";
        assert_eq!(extract_json_object(raw), Some("{\"hasConflict\": false}"));
    }

    #[test]
    fn braces_inside_strings_do_not_misbound() {
        let raw = r#"{"hasConflict": true, "conflictDetails": "the text says {east} but lore says west"}"#;
        assert_eq!(extract_json_object(raw), Some(raw));
    }

    #[test]
    fn nested_objects_balance() {
        let raw = r#"prefix {"a": {"b": 1}} suffix"#;
        assert_eq!(extract_json_object(raw), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn escaped_quotes_inside_strings_are_handled() {
        let raw = r#"{"conflictDetails": "she said \"go {west}\"", "hasConflict": true}"#;
        assert_eq!(extract_json_object(raw), Some(raw));
    }

    #[test]
    fn no_object_means_no_extraction() {
        assert!(extract_json_object("no json here at all").is_none());
        assert!(extract_json_object("unbalanced { opening").is_none());
    }

    #[test]
    fn parse_verdict_accepts_terse_judge_output() {
        let verdict = parse_verdict(r#"{"hasConflict": false}"#).unwrap();
        assert!(!verdict.has_conflict());
    }

    #[tokio::test]
    async fn zero_facts_short_circuits_without_judge_call() {
        let generation = Arc::new(ScriptedGeneration::new(vec![]));
        let validator = validator(Arc::new(MemoryIndex::new()), generation.clone());

        let verdict = validator.validate("some reply", "mira").await;
        match verdict {
            Verdict::Degraded { has_conflict, message } => {
                assert!(!has_conflict);
                assert_eq!(message, NO_FACTS_MESSAGE);
            }
            other => panic!("expected degraded verdict, got {other:?}"),
        }
        assert_eq!(generation.calls(), 0, "judge must not be called with zero facts");
    }

    #[tokio::test]
    async fn judge_response_with_prose_still_extracts() {
        let index = seeded_index().await;
        let generation = Arc::new(ScriptedGeneration::new(vec![Ok(
            "Here you go: {\"hasConflict\": true, \"conflictDetails\": \"the shrine is east, not west\", \"suggestion\": \"say east\"} Anything else?".to_string(),
        )]));
        let validator = validator(index, generation.clone());

        let verdict = validator.validate("the shrine is west of the falls", "mira").await;
        assert!(verdict.has_conflict());
        assert_eq!(generation.calls(), 1);
    }

    #[tokio::test]
    async fn judge_response_without_json_degrades() {
        let index = seeded_index().await;
        let generation = Arc::new(ScriptedGeneration::new(vec![Ok(
            "I could not decide, sorry.".to_string(),
        )]));
        let validator = validator(index, generation);

        let verdict = validator.validate("the shrine is west", "mira").await;
        match verdict {
            Verdict::Degraded { message, .. } => assert_eq!(message, FAILED_MESSAGE),
            other => panic!("expected degraded verdict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn judge_failure_degrades_instead_of_erroring() {
        let index = seeded_index().await;
        let generation = Arc::new(ScriptedGeneration::new(vec![Err(
            ReverieError::Provider {
                message: "overloaded".into(),
                source: None,
            },
        )]));
        let validator = validator(index, generation);

        let verdict = validator.validate("anything", "mira").await;
        assert!(!verdict.has_conflict());
        assert!(matches!(verdict, Verdict::Degraded { .. }));
    }
}
