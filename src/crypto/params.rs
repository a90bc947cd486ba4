// src/crypto/params.rs
//! Key-derivation parameters for the `v2` format
//!
//! One immutable value per codec. Blobs do not record the parameters they were
//! sealed with, so a corpus must be read back with the same parameter set.

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_KDF_ITERATIONS, DEFAULT_KDF_MEMORY_KIB, DEFAULT_KDF_PARALLELISM, DEFAULT_SALT_LEN,
    KEY_LEN, MIN_SALT_LEN, NONCE_LEN,
};
use crate::enums::CodecPreset;
use crate::error::CodecError;

/// Argon2id cost and blob layout sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecParams {
    /// Argon2id passes (t_cost)
    pub iterations: u32,
    /// Argon2id memory in KiB (m_cost)
    pub memory_kib: u32,
    /// Argon2id lanes (p_cost)
    pub parallelism: u32,
    pub key_len: usize,
    pub salt_len: usize,
    pub nonce_len: usize,
}

impl CodecParams {
    /// 3 iterations, 64 MiB, 4 lanes
    pub const fn standard() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
            memory_kib: DEFAULT_KDF_MEMORY_KIB,
            parallelism: DEFAULT_KDF_PARALLELISM,
            key_len: KEY_LEN,
            salt_len: DEFAULT_SALT_LEN,
            nonce_len: NONCE_LEN,
        }
    }

    /// 4 iterations, 256 MiB, 4 lanes
    pub const fn high_security() -> Self {
        Self {
            iterations: 4,
            memory_kib: 256 * 1024,
            ..Self::standard()
        }
    }

    /// 2 iterations, 19 MiB, 1 lane
    pub const fn lightweight() -> Self {
        Self {
            iterations: 2,
            memory_kib: 19 * 1024,
            parallelism: 1,
            ..Self::standard()
        }
    }

    pub const fn from_preset(preset: CodecPreset) -> Self {
        match preset {
            CodecPreset::Default => Self::standard(),
            CodecPreset::HighSecurity => Self::high_security(),
            CodecPreset::Lightweight => Self::lightweight(),
        }
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.key_len != KEY_LEN {
            return Err(CodecError::InvalidParams(format!(
                "key_len must be {KEY_LEN} for AES-256, got {}",
                self.key_len
            )));
        }
        if self.nonce_len != NONCE_LEN {
            return Err(CodecError::InvalidParams(format!(
                "nonce_len must be {NONCE_LEN} for AES-GCM, got {}",
                self.nonce_len
            )));
        }
        if self.salt_len < MIN_SALT_LEN {
            return Err(CodecError::InvalidParams(format!(
                "salt_len must be at least {MIN_SALT_LEN}, got {}",
                self.salt_len
            )));
        }
        if self.iterations == 0 || self.parallelism == 0 {
            return Err(CodecError::InvalidParams(
                "iterations and parallelism must be non-zero".into(),
            ));
        }
        // Argon2 requires at least 8 KiB per lane
        if self.memory_kib < 8 * self.parallelism {
            return Err(CodecError::InvalidParams(format!(
                "memory_kib must be at least {} for {} lane(s)",
                8 * self.parallelism,
                self.parallelism
            )));
        }
        Ok(())
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        Self::standard()
    }
}
