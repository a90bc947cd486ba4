// src/config/app.rs
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::defaults::*;
use crate::consts::CONFIG_ENV_VAR;
use crate::crypto::CodecParams;
use crate::enums::CodecPreset;
use crate::error::ConfigError;
use crate::token::TOKEN_LENGTH_FLOOR;

/// Everything tunable about a vault, built once and shared by reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub codec: CodecParams,
    pub tokens: TokenConfig,
    pub rotation: RotationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Length used by `TokenVault::create_default`
    pub default_length: usize,
    /// Generate-and-check rounds before giving up on a unique token
    pub create_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotationConfig {
    /// Above this many records, work in pages instead of loading everything
    pub paging_threshold: usize,
    pub page_size: usize,
    /// Above this many records, fan out to the worker pool
    pub parallel_threshold: usize,
    pub batch_size: usize,
    pub workers: usize,
    /// Bounded work-queue capacity, in batches
    pub queue_depth: usize,
}

/// `[codec]` as written in TOML: a preset plus optional per-field overrides
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CodecSection {
    preset: Option<String>,
    iterations: Option<u32>,
    memory_kib: Option<u32>,
    parallelism: Option<u32>,
    key_len: Option<usize>,
    salt_len: Option<usize>,
    nonce_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    codec: CodecSection,
    tokens: TokenConfig,
    rotation: RotationConfig,
}

impl CodecSection {
    fn resolve(self) -> Result<CodecParams, ConfigError> {
        let preset = match self.preset.as_deref() {
            Some(name) => name.parse::<CodecPreset>()?,
            None => CodecPreset::Default,
        };
        let base = CodecParams::from_preset(preset);
        Ok(CodecParams {
            iterations: self.iterations.unwrap_or(base.iterations),
            memory_kib: self.memory_kib.unwrap_or(base.memory_kib),
            parallelism: self.parallelism.unwrap_or(base.parallelism),
            key_len: self.key_len.unwrap_or(base.key_len),
            salt_len: self.salt_len.unwrap_or(base.salt_len),
            nonce_len: self.nonce_len.unwrap_or(base.nonce_len),
        })
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            codec: CodecParams::standard(),
            tokens: TokenConfig::default(),
            rotation: RotationConfig::default(),
        }
    }
}

impl VaultConfig {
    /// Defaults with a different codec parameter set
    pub fn with_codec(codec: CodecParams) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let config = Self {
            codec: file.codec.resolve()?,
            tokens: file.tokens,
            rotation: file.rotation,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the file named by `ETV_CONFIG` (default `etv-config.toml`),
    /// falling back to built-in defaults when it does not exist
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if Path::new(&config_path).exists() {
            Self::load(&config_path)
        } else {
            warn!(path = %config_path, "config file not found, using built-in defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.codec
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let tokens = &self.tokens;
        if tokens.min_length < TOKEN_LENGTH_FLOOR {
            return Err(ConfigError::Invalid(format!(
                "tokens.min_length must be at least {TOKEN_LENGTH_FLOOR}"
            )));
        }
        if tokens.max_length < tokens.min_length {
            return Err(ConfigError::Invalid(
                "tokens.max_length must not be below tokens.min_length".into(),
            ));
        }
        if !(tokens.min_length..=tokens.max_length).contains(&tokens.default_length) {
            return Err(ConfigError::Invalid(
                "tokens.default_length must lie within the token bounds".into(),
            ));
        }
        if tokens.create_attempts == 0 {
            return Err(ConfigError::Invalid("tokens.create_attempts must be non-zero".into()));
        }

        let rotation = &self.rotation;
        for (name, value) in [
            ("page_size", rotation.page_size),
            ("batch_size", rotation.batch_size),
            ("workers", rotation.workers),
            ("queue_depth", rotation.queue_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("rotation.{name} must be non-zero")));
            }
        }
        Ok(())
    }
}
