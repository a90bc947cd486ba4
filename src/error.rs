// src/error.rs
//! Public error types for the entire crate
//!
//! One enum per layer, all funnelled into [`VaultError`] at the public API.
//! No variant ever carries a secret value, password or key.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures of the crypto codec
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unknown ciphertext format version")]
    UnknownVersion,

    /// Wrong password and corrupted data are indistinguishable in both formats
    #[error("decryption failed (wrong password or corrupted data)")]
    Decryption,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed")]
    Encryption,

    #[error("invalid codec parameters: {0}")]
    InvalidParams(String),
}

/// Failures of the token generator
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token length {requested} outside allowed range {min}..={max}")]
    LengthOutOfBounds {
        requested: usize,
        min: usize,
        max: usize,
    },
}

/// Failures of the record repository, propagated verbatim and never retried
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("a record with token {token:?} already exists")]
    Duplicate { token: String },

    #[error("no record with id {0}")]
    MissingId(uuid::Uuid),

    #[error("repository lock poisoned")]
    Poisoned,

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Failures while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown codec preset {0:?}")]
    UnknownPreset(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Public error type of every vault and rotation operation
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("token must not be empty")]
    EmptyToken,

    #[error("password must not be empty")]
    EmptyPassword,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("token {token:?} not found")]
    NotFound { token: String },

    #[error("token {token:?} expired at {expired_at}")]
    Expired {
        token: String,
        expired_at: DateTime<Utc>,
    },

    #[error("token {token:?} already exists")]
    TokenExists { token: String },

    #[error("could not generate a unique token after {attempts} attempts")]
    TokenCollision { attempts: u32 },

    #[error("decryption failed: {0}")]
    Decryption(#[source] CodecError),

    #[error("encryption failed: {0}")]
    Encoding(#[source] CodecError),

    #[error("operation cancelled after {processed} record(s): {reason}")]
    Cancelled { processed: u64, reason: String },

    #[error("operation failed after {processed} record(s): {source}")]
    Interrupted {
        processed: u64,
        #[source]
        source: Box<VaultError>,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl VaultError {
    /// Records already committed when a long-running operation stopped early
    pub fn processed(&self) -> Option<u64> {
        match self {
            VaultError::Cancelled { processed, .. } | VaultError::Interrupted { processed, .. } => {
                Some(*processed)
            }
            _ => None,
        }
    }

    /// Attach the count of records already committed by a long-running operation
    pub fn with_progress(self, processed: u64) -> Self {
        match self {
            VaultError::Cancelled { reason, .. } => VaultError::Cancelled { processed, reason },
            VaultError::Interrupted { source, .. } => VaultError::Interrupted { processed, source },
            other => VaultError::Interrupted {
                processed,
                source: Box::new(other),
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, VaultError::Cancelled { .. })
    }
}
