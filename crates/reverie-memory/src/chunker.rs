// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive character chunker for archive ingestion.
//!
//! Splits a document on a prioritized separator list (paragraph, line,
//! word, then raw character windows), merges adjacent small pieces up to
//! the configured chunk size, and carries a fixed-size overlap from each
//! chunk into the next. Splitting is deterministic: identical input and
//! configuration always yield identical chunk boundaries and ids.

use reverie_core::{ArchiveMetadata, Chunk, ReverieError};

/// Separator priority for recursive descent.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Chunking parameters. Lengths are counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Maximum chunk length.
    pub chunk_size: usize,
    /// Overlap repeated from the tail of chunk *i* at the head of chunk
    /// *i+1*.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Deterministic document splitter.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Creates a chunker, failing fast on invalid parameters. Never
    /// silently clamps.
    pub fn new(config: ChunkerConfig) -> Result<Self, ReverieError> {
        if config.chunk_size == 0 {
            return Err(ReverieError::Config(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if config.chunk_size <= config.chunk_overlap {
            return Err(ReverieError::Config(format!(
                "chunk_size ({}) must exceed chunk_overlap ({})",
                config.chunk_size, config.chunk_overlap
            )));
        }
        Ok(Self { config })
    }

    /// Splits `text` into chunks tagged `"<persona>-<i>"`, zero-based.
    ///
    /// Text no longer than one chunk returns a single chunk with no
    /// overlap. Empty text returns no chunks.
    pub fn split(&self, text: &str, metadata: &ArchiveMetadata) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let texts = if char_len(text) <= self.config.chunk_size {
            vec![text.to_string()]
        } else {
            self.merge(decompose(
                text,
                &SEPARATORS,
                self.config.chunk_size - self.config.chunk_overlap,
            ))
        };

        texts
            .into_iter()
            .enumerate()
            .map(|(i, chunk_text)| Chunk {
                id: format!("{}-{i}", metadata.persona),
                text: chunk_text,
                metadata: metadata.clone(),
            })
            .collect()
    }

    /// Merges decomposed pieces into chunks of at most `chunk_size`
    /// characters, seeding each chunk after the first with the previous
    /// chunk's trailing overlap.
    fn merge(&self, pieces: Vec<&str>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            if current_len > 0 && current_len + piece_len > self.config.chunk_size {
                let tail = char_tail(&current, self.config.chunk_overlap);
                chunks.push(current);
                current_len = char_len(&tail);
                current = tail;
            }
            current.push_str(piece);
            current_len += piece_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// Recursively splits `text` into pieces of at most `limit` characters,
/// keeping separators attached so the pieces concatenate back to the
/// original text.
fn decompose<'a>(text: &'a str, separators: &[&str], limit: usize) -> Vec<&'a str> {
    if char_len(text) <= limit {
        return vec![text];
    }

    if let Some((separator, rest)) = separators.split_first() {
        let mut pieces = Vec::new();
        for part in text.split_inclusive(separator) {
            if char_len(part) <= limit {
                pieces.push(part);
            } else {
                pieces.extend(decompose(part, rest, limit));
            }
        }
        pieces
    } else {
        char_windows(text, limit)
    }
}

/// Last-resort split into fixed-width character windows.
fn char_windows(text: &str, width: usize) -> Vec<&str> {
    let mut windows = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == width {
            windows.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        windows.push(&text[start..]);
    }
    windows
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of `s`.
fn char_tail(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = char_len(s);
    if total <= n {
        return s.to_string();
    }
    let start = s
        .char_indices()
        .nth(total - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    s[start..].to_string()
}
