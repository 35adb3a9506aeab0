// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Reverie configuration system.

use reverie_config::model::ReverieConfig;
use reverie_config::{load_and_validate_str, load_config_from_str, DEFAULT_PERSONA_ID};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_reverie_config() {
    let toml = r#"
[agent]
name = "lorekeeper"
log_level = "debug"
history_window = 3

[dashscope]
api_key = "sk-test-123"
embedding_model = "text-embedding-v2"
embedding_dimension = 1536
generation_model = "qwen-turbo"

[pinecone]
api_key = "pc-test-456"
index_host = "https://lore-abc123.svc.pinecone.io"

[memory]
chunk_size = 400
chunk_overlap = 40
embed_delay_ms = 150
archive_top_k = 4

[gateway]
host = "0.0.0.0"
port = 9000

[[personas]]
id = "mira"
system_prompt = "You are Mira, keeper of the river shrine."
retrieval = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "lorekeeper");
    assert_eq!(config.agent.history_window, 3);
    assert_eq!(config.dashscope.api_key.as_deref(), Some("sk-test-123"));
    assert_eq!(config.pinecone.api_key.as_deref(), Some("pc-test-456"));
    assert_eq!(
        config.pinecone.index_host.as_deref(),
        Some("https://lore-abc123.svc.pinecone.io")
    );
    assert_eq!(config.memory.chunk_size, 400);
    assert_eq!(config.memory.chunk_overlap, 40);
    assert_eq!(config.memory.embed_delay_ms, 150);
    assert_eq!(config.memory.archive_top_k, 4);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.personas.len(), 1);
    assert_eq!(config.personas[0].id, "mira");
    assert!(config.personas[0].retrieval);
}

/// Unknown field in a section is rejected with an actionable error.
#[test]
fn unknown_field_produces_error() {
    let toml = r#"
[memory]
chunk_sze = 400
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("chunk_sze"),
        "error should mention the unknown key, got: {err_str}"
    );
}

/// Missing sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.name, "reverie");
    assert_eq!(config.agent.history_window, 5);
    assert!(config.dashscope.api_key.is_none());
    assert_eq!(config.dashscope.embedding_model, "text-embedding-v2");
    assert_eq!(config.dashscope.embedding_dimension, 1536);
    assert_eq!(config.dashscope.generation_model, "qwen-turbo");
    assert!(config.pinecone.index_host.is_none());
    assert_eq!(config.memory.chunk_size, 500);
    assert_eq!(config.memory.chunk_overlap, 50);
    assert_eq!(config.memory.validator_top_k, 5);
    assert_eq!(config.personas.len(), 1);
    assert_eq!(config.personas[0].id, DEFAULT_PERSONA_ID);
}

/// Env-style dotted overrides take precedence over TOML values.
#[test]
fn override_takes_precedence_over_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[dashscope]
api_key = "from-toml"
"#;

    // Simulate REVERIE_DASHSCOPE_API_KEY via a dotted override.
    let config: ReverieConfig = Figment::new()
        .merge(Serialized::defaults(ReverieConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("dashscope.api_key", "from-env"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.dashscope.api_key.as_deref(), Some("from-env"));
}

/// Missing config files are silently skipped (Figment's Toml::file behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: ReverieConfig = Figment::new()
        .merge(Serialized::defaults(ReverieConfig::default()))
        .merge(Toml::file("/nonexistent/path/reverie.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.agent.name, "reverie");
}

/// load_and_validate_str rejects configs that parse but cannot run.
#[test]
fn validation_rejects_bad_chunking() {
    let toml = r#"
[memory]
chunk_size = 40
chunk_overlap = 50
"#;

    let err = load_and_validate_str(toml).expect_err("overlap >= size must fail fast");
    assert!(err.to_string().contains("chunk_overlap"));
}

/// Personas declared in TOML replace the default table entirely.
#[test]
fn personas_table_replaces_default() {
    let toml = r#"
[[personas]]
id = "mira"
system_prompt = "You are Mira."
retrieval = true

[[personas]]
id = "general"
system_prompt = "You are a helpful assistant."
"#;

    let config = load_and_validate_str(toml).expect("persona table should load");
    assert_eq!(config.personas.len(), 2);
    assert!(config.persona("mira").unwrap().retrieval);
    assert!(!config.persona("general").unwrap().retrieval);
}
