// src/config/mod.rs
//! Configuration system for encrypted-token-vault
//!
//! One immutable [`VaultConfig`] per vault: TOML file, env-var path override,
//! built-in defaults. There is no global instance.

pub use app::{RotationConfig, TokenConfig, VaultConfig};
pub use defaults::DEFAULT_CONFIG_FILE;

mod app;
mod defaults;
