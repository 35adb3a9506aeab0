// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Reverie persona memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Reverie configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; API keys usually arrive via `REVERIE_*` env vars.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReverieConfig {
    /// Engine identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// DashScope embedding/generation provider settings.
    #[serde(default)]
    pub dashscope: DashScopeConfig,

    /// Pinecone vector index settings.
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Memory pipeline settings (chunking, pacing, retrieval depth).
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Gateway HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Persona table. Unknown persona ids fall back to the default persona.
    #[serde(default = "default_personas")]
    pub personas: Vec<PersonaConfig>,
}

impl Default for ReverieConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            dashscope: DashScopeConfig::default(),
            pinecone: PineconeConfig::default(),
            memory: MemoryConfig::default(),
            gateway: GatewayConfig::default(),
            personas: default_personas(),
        }
    }
}

/// Engine identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the engine.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How many recent turns of client-supplied history enter the prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            history_window: default_history_window(),
        }
    }
}

fn default_agent_name() -> String {
    "reverie".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_window() -> usize {
    5
}

/// DashScope provider configuration (embeddings + text generation).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashScopeConfig {
    /// DashScope API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the DashScope API.
    #[serde(default = "default_dashscope_base_url")]
    pub base_url: String,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Fixed embedding dimension for the lifetime of the index.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Text generation model identifier.
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
}

impl Default for DashScopeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_dashscope_base_url(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            generation_model: default_generation_model(),
        }
    }
}

fn default_dashscope_base_url() -> String {
    "https://dashscope.aliyuncs.com/api/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-v2".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_generation_model() -> String {
    "qwen-turbo".to_string()
}

/// Pinecone vector index configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PineconeConfig {
    /// Pinecone API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Data-plane host of the index, e.g. `https://lore-abc123.svc.pinecone.io`.
    #[serde(default)]
    pub index_host: Option<String>,
}

/// Memory pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap carried between consecutive chunks, in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Delay between embedding calls during batch ingestion, in milliseconds.
    /// Throughput/latency tradeoff for provider rate limits, not correctness.
    #[serde(default = "default_embed_delay_ms")]
    pub embed_delay_ms: u64,

    /// Archive hits fetched per turn.
    #[serde(default = "default_archive_top_k")]
    pub archive_top_k: usize,

    /// Conversation hits recalled per turn.
    #[serde(default = "default_recall_top_k")]
    pub recall_top_k: usize,

    /// Archive facts fetched per consistency check.
    #[serde(default = "default_validator_top_k")]
    pub validator_top_k: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embed_delay_ms: default_embed_delay_ms(),
            archive_top_k: default_archive_top_k(),
            recall_top_k: default_recall_top_k(),
            validator_top_k: default_validator_top_k(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_embed_delay_ms() -> u64 {
    200
}

fn default_archive_top_k() -> usize {
    3
}

fn default_recall_top_k() -> usize {
    3
}

fn default_validator_top_k() -> usize {
    5
}

/// Gateway HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8780
}

/// A fixed persona the engine can speak as.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    /// Stable identifier; doubles as the archive namespace key.
    pub id: String,

    /// System instructions for this persona. Wording is configuration,
    /// not code.
    pub system_prompt: String,

    /// Whether this persona uses archive retrieval and conversation memory.
    #[serde(default)]
    pub retrieval: bool,
}

/// The id of the fallback persona used for unknown persona requests.
pub const DEFAULT_PERSONA_ID: &str = "general";

fn default_personas() -> Vec<PersonaConfig> {
    vec![PersonaConfig {
        id: DEFAULT_PERSONA_ID.to_string(),
        system_prompt: "You are a thoughtful, plain-spoken assistant.".to_string(),
        retrieval: false,
    }]
}

impl ReverieConfig {
    /// Resolves a persona by id, falling back to the default persona, then
    /// to the first configured persona if the default was renamed away.
    pub fn persona(&self, id: &str) -> Option<&PersonaConfig> {
        self.personas
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.personas.iter().find(|p| p.id == DEFAULT_PERSONA_ID))
            .or_else(|| self.personas.first())
    }
}
