// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Reverie workspace.
//!
//! The external vector store only accepts flat, scalar-valued metadata.
//! Rather than an open `serde_json::Value` bag, each record kind carries a
//! closed, typed metadata struct ([`ArchiveMetadata`], [`ConversationMetadata`])
//! so the scalar-only invariant holds at compile time. A narrow
//! [`ScalarMap`] escape hatch remains for provider passthrough fields and
//! caller-supplied filters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved metadata key carrying the literal text a vector was derived from.
///
/// Every stored record includes it, so a retrieval hit is self-describing
/// without a second lookup.
pub const TEXT_KEY: &str = "text";

/// Metadata key holding the persona a lore chunk belongs to.
pub const PERSONA_KEY: &str = "persona";

/// Metadata `type` value marking conversation records.
pub const CONVERSATION_TYPE: &str = "conversation";

/// Sentinel answer substituted when a turn produces no usable text.
///
/// Deliberately phrased so it cannot be mistaken for real model output.
pub const FALLBACK_ANSWER: &str = "...the connection falters. No answer made it through.";

/// A scalar metadata value: the only value kinds the vector store accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Converts a JSON value into a scalar, or `None` for arrays, objects,
    /// and nulls. This is the normalization boundary: non-scalar fields are
    /// dropped here, never stored.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(ScalarValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ScalarValue::Integer(i))
                } else {
                    n.as_f64().map(ScalarValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(ScalarValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Returns the text content if this is a string value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Integer(i)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

/// Flat scalar-valued metadata, as stored and filtered by the vector store.
pub type ScalarMap = BTreeMap<String, ScalarValue>;

/// Sanitizes an arbitrary JSON value into a flat scalar map.
///
/// Non-object inputs yield an empty map; non-scalar fields are dropped.
pub fn sanitize_scalar_map(value: &serde_json::Value) -> ScalarMap {
    let mut map = ScalarMap::new();
    if let serde_json::Value::Object(fields) = value {
        for (key, val) in fields {
            if let Some(scalar) = ScalarValue::from_json(val) {
                map.insert(key.clone(), scalar);
            }
        }
    }
    map
}

/// Typed metadata for a lore archive record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// Persona (or source) identifier used as the exact-match filter key.
    pub persona: String,
    /// Document kind, e.g. "character" or "world".
    pub kind: String,
    /// Provider passthrough fields; scalar-only by construction.
    #[serde(default)]
    pub extra: ScalarMap,
}

impl ArchiveMetadata {
    /// Flattens into the wire-level scalar map, attaching the chunk text
    /// under the reserved [`TEXT_KEY`].
    pub fn to_scalar_map(&self, text: &str) -> ScalarMap {
        let mut map = self.extra.clone();
        map.insert(PERSONA_KEY.into(), self.persona.as_str().into());
        map.insert("kind".into(), self.kind.as_str().into());
        map.insert(TEXT_KEY.into(), text.into());
        map
    }

    /// Exact-match filter selecting one persona's archive namespace.
    pub fn persona_filter(persona: &str) -> ScalarMap {
        ScalarMap::from([(PERSONA_KEY.to_string(), persona.into())])
    }
}

/// Typed metadata for a conversation turn record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMetadata {
    /// Persona this turn belongs to.
    pub role: String,
    /// The user's question, verbatim.
    pub question: String,
    /// The persona's answer, verbatim.
    pub answer: String,
    /// Epoch milliseconds at record time.
    pub timestamp: i64,
}

impl ConversationMetadata {
    /// Flattens into the wire-level scalar map, attaching the embedded text
    /// under the reserved [`TEXT_KEY`].
    pub fn to_scalar_map(&self, text: &str) -> ScalarMap {
        ScalarMap::from([
            ("type".to_string(), CONVERSATION_TYPE.into()),
            ("role".to_string(), self.role.as_str().into()),
            ("question".to_string(), self.question.as_str().into()),
            ("answer".to_string(), self.answer.as_str().into()),
            ("timestamp".to_string(), self.timestamp.into()),
            (TEXT_KEY.to_string(), text.into()),
        ])
    }

    /// Exact-match filter selecting one persona's conversation records.
    pub fn recall_filter(persona: &str) -> ScalarMap {
        ScalarMap::from([
            ("type".to_string(), CONVERSATION_TYPE.into()),
            ("role".to_string(), persona.into()),
        ])
    }
}

/// A bounded text segment derived from a longer source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Deterministic id: `"<source_id>-<index>"`, zero-based. Re-ingesting
    /// the same source yields the same ids, so upserts overwrite in place.
    pub id: String,
    /// Chunk text, bounded by the configured chunk size.
    pub text: String,
    /// Archive metadata attached to every chunk of the source.
    pub metadata: ArchiveMetadata,
}

/// A vector with flat metadata, as written to the external store.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: ScalarMap,
}

impl VectorRecord {
    /// Builds an archive record. The chunk text lands under [`TEXT_KEY`].
    pub fn archive(id: String, embedding: Vec<f32>, text: &str, meta: &ArchiveMetadata) -> Self {
        Self {
            id,
            embedding,
            metadata: meta.to_scalar_map(text),
        }
    }

    /// Builds a conversation record. The embedded rendering lands under
    /// [`TEXT_KEY`].
    pub fn conversation(
        id: String,
        embedding: Vec<f32>,
        text: &str,
        meta: &ConversationMetadata,
    ) -> Self {
        Self {
            id,
            embedding,
            metadata: meta.to_scalar_map(text),
        }
    }
}

/// A normalized similarity match from the vector store.
///
/// Fields the store omitted stay absent; they are never backfilled with
/// sentinels that could be confused with real data.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub score: Option<f32>,
    pub metadata: ScalarMap,
}

impl QueryMatch {
    /// The stored literal text, when present.
    pub fn text(&self) -> Option<&str> {
        self.metadata.get(TEXT_KEY).and_then(ScalarValue::as_text)
    }

    /// A named string metadata field, when present.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(ScalarValue::as_text)
    }
}

/// An archive retrieval hit: score, self-describing text, and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveHit {
    pub score: Option<f32>,
    pub text: String,
    pub metadata: ScalarMap,
}

/// A conversation recall hit: score plus the recorded question/answer pair.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationHit {
    pub score: Option<f32>,
    pub question: String,
    pub answer: String,
}

/// The consistency validator's structured output.
///
/// Produced once per generated answer and never recomputed. The degraded
/// form is used when no relevant facts exist or extraction fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Verdict {
    #[serde(rename_all = "camelCase")]
    Judged {
        has_conflict: bool,
        conflict_details: String,
        suggestion: String,
    },
    #[serde(rename_all = "camelCase")]
    Degraded { has_conflict: bool, message: String },
}

impl Verdict {
    /// The degraded no-conflict verdict with an explanatory message.
    pub fn degraded(message: impl Into<String>) -> Self {
        Verdict::Degraded {
            has_conflict: false,
            message: message.into(),
        }
    }

    /// Whether the judge found a conflict. Degraded verdicts never do.
    pub fn has_conflict(&self) -> bool {
        match self {
            Verdict::Judged { has_conflict, .. } => *has_conflict,
            Verdict::Degraded { .. } => false,
        }
    }
}

/// Message role in the completion conversation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in the completion conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_non_scalars() {
        let value = serde_json::json!({
            "persona": "mira",
            "depth": 3,
            "active": true,
            "weight": 0.5,
            "tags": ["a", "b"],
            "nested": {"x": 1},
            "missing": null,
        });
        let map = sanitize_scalar_map(&value);
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("persona"), Some(&ScalarValue::Text("mira".into())));
        assert_eq!(map.get("depth"), Some(&ScalarValue::Integer(3)));
        assert_eq!(map.get("active"), Some(&ScalarValue::Bool(true)));
        assert_eq!(map.get("weight"), Some(&ScalarValue::Float(0.5)));
        assert!(!map.contains_key("tags"));
        assert!(!map.contains_key("nested"));
        assert!(!map.contains_key("missing"));
    }

    #[test]
    fn sanitize_non_object_is_empty() {
        assert!(sanitize_scalar_map(&serde_json::json!("just a string")).is_empty());
        assert!(sanitize_scalar_map(&serde_json::json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn archive_record_carries_text_under_reserved_key() {
        let meta = ArchiveMetadata {
            persona: "mira".into(),
            kind: "character".into(),
            extra: ScalarMap::new(),
        };
        let record = VectorRecord::archive("mira-0".into(), vec![0.1, 0.2], "born by the river", &meta);
        assert_eq!(
            record.metadata.get(TEXT_KEY),
            Some(&ScalarValue::Text("born by the river".into()))
        );
        assert_eq!(
            record.metadata.get(PERSONA_KEY),
            Some(&ScalarValue::Text("mira".into()))
        );
    }

    #[test]
    fn conversation_record_map_is_complete() {
        let meta = ConversationMetadata {
            role: "mira".into(),
            question: "where were you born?".into(),
            answer: "by the river".into(),
            timestamp: 1_700_000_000_000,
        };
        let map = meta.to_scalar_map("User asked: where were you born?\nYou answered: by the river");
        assert_eq!(map.get("type"), Some(&ScalarValue::Text(CONVERSATION_TYPE.into())));
        assert_eq!(map.get("role"), Some(&ScalarValue::Text("mira".into())));
        assert_eq!(map.get("timestamp"), Some(&ScalarValue::Integer(1_700_000_000_000)));
        assert!(map.contains_key(TEXT_KEY));
    }

    #[test]
    fn recall_filter_scopes_type_and_role() {
        let filter = ConversationMetadata::recall_filter("mira");
        assert_eq!(filter.get("type"), Some(&ScalarValue::Text(CONVERSATION_TYPE.into())));
        assert_eq!(filter.get("role"), Some(&ScalarValue::Text("mira".into())));
    }

    #[test]
    fn verdict_serializes_camel_case() {
        let verdict = Verdict::Judged {
            has_conflict: true,
            conflict_details: "the river is in the east".into(),
            suggestion: "say east, not west".into(),
        };
        let json = serde_json::to_string(&verdict).unwrap();
        assert!(json.contains("\"hasConflict\":true"));
        assert!(json.contains("\"conflictDetails\""));

        let degraded = Verdict::degraded("no archived lore to check against");
        let json = serde_json::to_string(&degraded).unwrap();
        assert!(json.contains("\"hasConflict\":false"));
        assert!(json.contains("\"message\""));
        assert!(!degraded.has_conflict());
    }

    #[test]
    fn verdict_parses_judge_shape() {
        let json = r#"{"hasConflict":false,"conflictDetails":"none","suggestion":"none"}"#;
        let verdict: Verdict = serde_json::from_str(json).unwrap();
        assert!(matches!(verdict, Verdict::Judged { has_conflict: false, .. }));
    }

    #[test]
    fn chat_roles_serialize_lowercase() {
        let msg = ChatMessage::system("stay in character");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"system\""));
        let msg = ChatMessage::assistant("I will");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
    }

    #[test]
    fn query_match_optional_fields_stay_absent() {
        let hit = QueryMatch {
            id: "mira-0".into(),
            score: None,
            metadata: ScalarMap::new(),
        };
        assert!(hit.score.is_none());
        assert!(hit.text().is_none());
    }
}
