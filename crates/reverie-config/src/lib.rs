// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Reverie persona memory engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides under the `REVERIE_` prefix.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{PersonaConfig, ReverieConfig, DEFAULT_PERSONA_ID};

use reverie_core::ReverieError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Loads from TOML files and env vars via Figment, then runs
/// post-deserialization validation. The high-level entry point for the
/// binary.
pub fn load_and_validate() -> Result<ReverieConfig, ReverieError> {
    let config = loader::load_config().map_err(|e| ReverieError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<ReverieConfig, ReverieError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| ReverieError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
