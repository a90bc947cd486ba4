// src/lib.rs
//! encrypted-token-vault: password-sealed secrets behind opaque tokens
//!
//! Features:
//! - Versioned ciphertexts: Argon2id + AES-256-GCM (`v2:`), legacy `v1:` decode
//! - Time-ordered tokens with a CSPRNG suffix
//! - Expiry, soft delete, restore and purge
//! - Bulk password rotation: paged, optionally parallel, cancellable
//! - In-memory and SQLite repositories behind one trait

pub mod aliases;
pub mod cancel;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod db;
pub mod enums;
pub mod error;
pub mod record;
pub mod rotation;
pub mod token;
pub mod vault;

// Re-export everything users need at the crate root
pub use aliases::{Password, SecretValue};
pub use cancel::Cancellation;
pub use config::{RotationConfig, TokenConfig, VaultConfig};
pub use crypto::{Codec, CodecParams};
pub use db::{ListQuery, MemoryRepository, OrderBy, RecordFilter, Repository, SqliteRepository};
pub use enums::{CodecPreset, ExecutionMode, FormatVersion, PurgeMode};
pub use error::{CodecError, ConfigError, RepositoryError, TokenError, VaultError};
pub use record::{RecordField, RecordInfo, SecretRecord};
pub use rotation::{RotationEngine, RotationPlan};
pub use token::{TokenGenerator, TokenSource};
pub use vault::{Result, TokenVault};
