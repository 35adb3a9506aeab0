// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `reverie query` command implementation.
//!
//! Searches one persona's archive and prints the ranked hits.

use reverie_config::ReverieConfig;
use reverie_core::ReverieError;

use crate::clients;

/// Runs the `reverie query` command.
pub async fn run_query(
    config: &ReverieConfig,
    persona: &str,
    query: &str,
    top_k: usize,
) -> Result<(), ReverieError> {
    let dashscope = clients::build_dashscope(config)?;
    let pinecone = clients::build_pinecone(config)?;
    let archive = clients::build_archive(config, dashscope, pinecone)?;

    let hits = archive.search(query, persona, top_k).await?;

    if hits.is_empty() {
        println!("no hits for '{persona}'; has its archive been ingested?");
        return Ok(());
    }

    println!("{} hits:", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        match hit.score {
            Some(score) => println!("[{}] score {score:.4}", i + 1),
            None => println!("[{}] score n/a", i + 1),
        }
        println!("{}", preview(&hit.text, 200));
        println!("---");
    }
    Ok(())
}

/// First `limit` characters of `text`, with an ellipsis when truncated.
fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{cut}...")
}
