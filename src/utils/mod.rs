//! Configuration utilities.

/// TOML infrastructure configuration (`evently.toml`).
pub mod toml_config;
