// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reverie - a persona memory engine.
//!
//! This is the binary entry point: `serve` runs the gateway, `ingest`
//! uploads a lore document into the archive, `query` searches it.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod clients;
mod ingest;
mod query;
mod serve;

/// Reverie - a persona memory engine.
#[derive(Parser, Debug)]
#[command(name = "reverie", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Reverie gateway server.
    Serve,
    /// Ingest a lore document into the archive.
    Ingest {
        /// Path to the document.
        file: PathBuf,
        /// Persona (source) id; defaults to the file stem.
        #[arg(long)]
        persona: Option<String>,
        /// Document kind stored in metadata.
        #[arg(long, default_value = "character")]
        kind: String,
    },
    /// Search a persona's archive.
    Query {
        /// Persona id to search.
        persona: String,
        /// Free-text query.
        query: String,
        /// Number of hits to fetch.
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("reverie={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match reverie_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("reverie: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Ingest {
            file,
            persona,
            kind,
        } => ingest::run_ingest(&config, &file, persona.as_deref(), &kind).await,
        Commands::Query {
            persona,
            query,
            top_k,
        } => query::run_query(&config, &persona, &query, top_k).await,
    };

    if let Err(e) = result {
        eprintln!("reverie: {e}");
        std::process::exit(1);
    }
}
