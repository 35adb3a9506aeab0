// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `reverie ingest` command implementation.
//!
//! Reads a lore document, chunks and embeds it sequentially (rate-limit
//! pacing between embedding calls), and upserts the vectors. A failed
//! embedding aborts the batch: nothing partial reaches the store, and the
//! provider's diagnostic is printed.

use std::path::Path;

use reverie_config::ReverieConfig;
use reverie_core::ReverieError;

use crate::clients;

/// Runs the `reverie ingest` command.
pub async fn run_ingest(
    config: &ReverieConfig,
    file: &Path,
    persona: Option<&str>,
    kind: &str,
) -> Result<(), ReverieError> {
    let content = std::fs::read_to_string(file).map_err(|e| {
        ReverieError::Config(format!("cannot read {}: {e}", file.display()))
    })?;
    let source_id = source_id_for(file, persona)?;

    let dashscope = clients::build_dashscope(config)?;
    let pinecone = clients::build_pinecone(config)?;
    let archive = clients::build_archive(config, dashscope, pinecone)?;

    println!("ingesting {} as '{source_id}' ({kind})", file.display());
    let written = archive.ingest(&content, &source_id, kind).await?;
    println!("wrote {written} vectors");
    Ok(())
}

/// Resolves the archive source id: explicit persona flag, else file stem.
fn source_id_for(file: &Path, persona: Option<&str>) -> Result<String, ReverieError> {
    if let Some(persona) = persona {
        return Ok(persona.to_string());
    }
    file.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ReverieError::Config(format!(
                "cannot derive a source id from {}; pass --persona",
                file.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn persona_flag_overrides_file_stem() {
        let path = PathBuf::from("/lore/mira.md");
        assert_eq!(source_id_for(&path, Some("river-keeper")).unwrap(), "river-keeper");
    }

    #[test]
    fn source_id_defaults_to_file_stem() {
        let path = PathBuf::from("/lore/mira.md");
        assert_eq!(source_id_for(&path, None).unwrap(), "mira");
    }

    #[test]
    fn unusable_path_requires_explicit_persona() {
        let path = PathBuf::from("/");
        assert!(source_id_for(&path, None).is_err());
    }
}
