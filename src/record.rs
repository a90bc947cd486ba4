// src/record.rs
//! The persisted secret record and its public metadata view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::FormatVersion;

/// One stored secret. `encrypted_value` is always a tagged codec blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: Uuid,
    pub token: String,
    pub encrypted_value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` = never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` = active
    pub soft_deleted_at: Option<DateTime<Utc>>,
}

impl SecretRecord {
    pub fn new(
        token: String,
        encrypted_value: String,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            encrypted_value,
            created_at: now,
            updated_at: now,
            expires_at,
            soft_deleted_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.soft_deleted_at.is_some()
    }
}

/// Columns a repository update may touch; everything else is left as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    EncryptedValue,
    UpdatedAt,
    ExpiresAt,
    SoftDeletedAt,
}

/// Metadata of a record, without its ciphertext
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInfo {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub soft_deleted_at: Option<DateTime<Utc>>,
    pub format: Option<FormatVersion>,
}

impl From<&SecretRecord> for RecordInfo {
    fn from(record: &SecretRecord) -> Self {
        Self {
            token: record.token.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            expires_at: record.expires_at,
            soft_deleted_at: record.soft_deleted_at,
            format: FormatVersion::detect(&record.encrypted_value),
        }
    }
}
