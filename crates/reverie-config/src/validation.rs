// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for the Reverie configuration.
//!
//! Figment catches shape errors; this pass catches values that parse fine
//! but would fail later in confusing places. Chunking parameters are
//! validated here so a bad config dies at startup, not mid-ingestion.

use std::collections::HashSet;

use reverie_core::ReverieError;

use crate::model::ReverieConfig;

/// Validates a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ReverieConfig) -> Result<(), ReverieError> {
    let mut problems = Vec::new();

    if config.memory.chunk_size == 0 {
        problems.push("memory.chunk_size must be greater than zero".to_string());
    }
    if config.memory.chunk_size <= config.memory.chunk_overlap {
        problems.push(format!(
            "memory.chunk_size ({}) must exceed memory.chunk_overlap ({})",
            config.memory.chunk_size, config.memory.chunk_overlap
        ));
    }
    if config.dashscope.embedding_dimension == 0 {
        problems.push("dashscope.embedding_dimension must be greater than zero".to_string());
    }
    if config.personas.is_empty() {
        problems.push("at least one persona must be configured".to_string());
    }

    let mut seen = HashSet::new();
    for persona in &config.personas {
        if persona.id.trim().is_empty() {
            problems.push("persona id must not be empty".to_string());
        }
        if !seen.insert(persona.id.as_str()) {
            problems.push(format!("duplicate persona id: {}", persona.id));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ReverieError::Config(problems.join("; ")))
    }
}
