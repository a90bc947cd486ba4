// src/vault.rs
//! Token lifecycle: the public face of the store
//!
//! A [`TokenVault`] owns a codec, a token source and a handle to some
//! [`Repository`]. Every call takes a [`Cancellation`]; single-record calls
//! only check it on entry, bulk calls poll it between records.
//!
//! Soft-deleted records are invisible to `read`, `update`, `soft_delete`,
//! `renew` and `read_many`. `delete`, `restore` and `inspect` still see them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::aliases::{Password, SecretValue};
use crate::cancel::Cancellation;
use crate::config::VaultConfig;
use crate::crypto::Codec;
use crate::db::{ListQuery, RecordFilter, Repository};
use crate::enums::PurgeMode;
use crate::error::{ConfigError, VaultError};
use crate::record::{RecordField, RecordInfo, SecretRecord};
use crate::rotation::RotationEngine;
use crate::token::{TokenGenerator, TokenSource};

pub type Result<T> = std::result::Result<T, VaultError>;

pub struct TokenVault {
    config: VaultConfig,
    codec: Codec,
    repo: Arc<dyn Repository>,
    tokens: Arc<dyn TokenSource>,
}

impl TokenVault {
    /// Validate `config` and build a vault over `repo`
    pub fn new(config: VaultConfig, repo: Arc<dyn Repository>) -> Result<Self> {
        config.validate()?;
        let codec =
            Codec::new(config.codec).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let tokens = Arc::new(TokenGenerator::new(
            config.tokens.min_length,
            config.tokens.max_length,
        ));
        Ok(Self {
            config,
            codec,
            repo,
            tokens,
        })
    }

    /// Replace the token generator, e.g. with a deterministic one
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    /// Store `value` under a freshly generated token of `token_length` characters
    pub fn create(
        &self,
        value: &str,
        password: &Password,
        token_length: usize,
        expires_at: Option<DateTime<Utc>>,
        cancel: &Cancellation,
    ) -> Result<String> {
        require_password(password)?;
        cancel.check(0)?;

        let token = self.unique_token(token_length)?;
        let blob = self.codec.encode(value, password).map_err(VaultError::Encoding)?;
        let record = SecretRecord::new(token.clone(), blob, expires_at, Utc::now());
        self.repo.create(&record)?;

        info!(id = %record.id, expires = ?expires_at, "secret created");
        Ok(token)
    }

    /// [`create`](Self::create) with the configured default token length
    pub fn create_default(
        &self,
        value: &str,
        password: &Password,
        expires_at: Option<DateTime<Utc>>,
        cancel: &Cancellation,
    ) -> Result<String> {
        self.create(value, password, self.config.tokens.default_length, expires_at, cancel)
    }

    /// Store `value` under a caller-chosen token
    pub fn create_custom(
        &self,
        token: &str,
        value: &str,
        password: &Password,
        expires_at: Option<DateTime<Utc>>,
        cancel: &Cancellation,
    ) -> Result<()> {
        require_token(token)?;
        require_password(password)?;
        cancel.check(0)?;

        if self.repo.find_by_token(token)?.is_some() {
            return Err(VaultError::TokenExists {
                token: token.to_string(),
            });
        }
        let blob = self.codec.encode(value, password).map_err(VaultError::Encoding)?;
        let record = SecretRecord::new(token.to_string(), blob, expires_at, Utc::now());
        self.repo.create(&record)?;

        info!(id = %record.id, "secret created with custom token");
        Ok(())
    }

    /// Decrypt the secret behind `token`
    ///
    /// Missing, expired and undecryptable records fail with distinct errors.
    pub fn read(
        &self,
        token: &str,
        password: &Password,
        cancel: &Cancellation,
    ) -> Result<SecretValue> {
        require_token(token)?;
        require_password(password)?;
        cancel.check(0)?;

        let record = self.active_record(token)?;
        if let Some(expired_at) = record.expires_at.filter(|_| record.is_expired_at(Utc::now())) {
            return Err(VaultError::Expired {
                token: token.to_string(),
                expired_at,
            });
        }
        self.codec
            .decode(&record.encrypted_value, password)
            .map_err(VaultError::Decryption)
    }

    /// Replace the value behind `token`, sealing it under `password`
    pub fn update(
        &self,
        token: &str,
        value: &str,
        password: &Password,
        cancel: &Cancellation,
    ) -> Result<()> {
        require_token(token)?;
        require_password(password)?;
        cancel.check(0)?;

        let mut record = self.active_record(token)?;
        record.encrypted_value = self
            .codec
            .encode(value, password)
            .map_err(VaultError::Encoding)?;
        record.updated_at = Utc::now();
        self.repo
            .update(&record, &[RecordField::EncryptedValue, RecordField::UpdatedAt])?;

        debug!(id = %record.id, "secret updated");
        Ok(())
    }

    /// Physically remove the record, soft-deleted or not
    pub fn delete(&self, token: &str, cancel: &Cancellation) -> Result<()> {
        require_token(token)?;
        cancel.check(0)?;

        let record = self.any_record(token)?;
        self.repo.delete_by_id(record.id)?;
        info!(id = %record.id, "secret deleted");
        Ok(())
    }

    pub fn soft_delete(&self, token: &str, cancel: &Cancellation) -> Result<()> {
        require_token(token)?;
        cancel.check(0)?;

        let mut record = self.active_record(token)?;
        let now = Utc::now();
        record.soft_deleted_at = Some(now);
        record.updated_at = now;
        self.repo
            .update(&record, &[RecordField::SoftDeletedAt, RecordField::UpdatedAt])?;

        info!(id = %record.id, "secret soft-deleted");
        Ok(())
    }

    /// Undo a soft delete; `NotFound` unless the record is currently soft-deleted
    pub fn restore(&self, token: &str, cancel: &Cancellation) -> Result<()> {
        require_token(token)?;
        cancel.check(0)?;

        let mut record = self.any_record(token)?;
        if !record.is_soft_deleted() {
            return Err(not_found(token));
        }
        record.soft_deleted_at = None;
        record.updated_at = Utc::now();
        self.repo
            .update(&record, &[RecordField::SoftDeletedAt, RecordField::UpdatedAt])?;

        info!(id = %record.id, "secret restored");
        Ok(())
    }

    /// Set a new expiry; `None` means the secret never expires
    ///
    /// Works on already-expired records too, which is how they are revived.
    pub fn renew(
        &self,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
        cancel: &Cancellation,
    ) -> Result<()> {
        require_token(token)?;
        cancel.check(0)?;

        let mut record = self.active_record(token)?;
        record.expires_at = expires_at;
        record.updated_at = Utc::now();
        self.repo
            .update(&record, &[RecordField::ExpiresAt, RecordField::UpdatedAt])?;

        debug!(id = %record.id, expires = ?expires_at, "secret renewed");
        Ok(())
    }

    /// Metadata only; never decrypts
    pub fn inspect(&self, token: &str, cancel: &Cancellation) -> Result<RecordInfo> {
        require_token(token)?;
        cancel.check(0)?;

        let record = self.any_record(token)?;
        Ok(RecordInfo::from(&record))
    }

    /// Decrypt many tokens at once
    ///
    /// Missing, soft-deleted and expired tokens are left out of the map. A
    /// record that fails to decrypt fails the whole call.
    pub fn read_many<S: AsRef<str>>(
        &self,
        tokens: &[S],
        password: &Password,
        cancel: &Cancellation,
    ) -> Result<HashMap<String, SecretValue>> {
        require_password(password)?;
        cancel.check(0)?;

        let mut seen = HashSet::new();
        let wanted: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !t.is_empty() && seen.insert(*t))
            .map(str::to_string)
            .collect();

        let now = Utc::now();
        let mut found = HashMap::with_capacity(wanted.len());
        for chunk in wanted.chunks(self.config.rotation.page_size) {
            cancel.check(0)?;
            let records = self
                .repo
                .list(&ListQuery::new(RecordFilter::active().with_tokens(chunk.to_vec())))?;

            for record in records.into_iter().filter(|r| !r.is_expired_at(now)) {
                let value = self
                    .codec
                    .decode(&record.encrypted_value, password)
                    .map_err(VaultError::Decryption)?;
                found.insert(record.token, value);
            }
        }

        debug!(requested = wanted.len(), found = found.len(), "bulk read");
        Ok(found)
    }

    /// Remove every record whose expiry has passed; returns how many were removed
    ///
    /// `Soft` marks active records as soft-deleted. `Hard` deletes rows,
    /// soft-deleted ones included. The table is walked in pages; on cancel or
    /// failure the error carries the number already purged.
    pub fn purge_expired(&self, mode: PurgeMode, cancel: &Cancellation) -> Result<u64> {
        cancel.check(0)?;

        let mut purged = 0u64;
        match self.purge_pages(mode, cancel, &mut purged) {
            Ok(()) => {
                info!(purged, mode = ?mode, "expired secrets purged");
                Ok(purged)
            }
            Err(error) => {
                warn!(purged, error = %error, "purge stopped early");
                Err(error.with_progress(purged))
            }
        }
    }

    fn purge_pages(&self, mode: PurgeMode, cancel: &Cancellation, purged: &mut u64) -> Result<()> {
        let filter = match mode {
            PurgeMode::Soft => RecordFilter::active(),
            PurgeMode::Hard => RecordFilter::everything(),
        };
        let page_size = self.config.rotation.page_size;
        let now = Utc::now();
        let mut offset = 0usize;

        loop {
            cancel.check(*purged)?;
            let page = self
                .repo
                .list(&ListQuery::page(filter.clone(), offset, page_size))?;
            let fetched = page.len();

            let mut removed = 0usize;
            for mut record in page.into_iter().filter(|r| r.is_expired_at(now)) {
                cancel.check(*purged)?;
                match mode {
                    PurgeMode::Soft => {
                        record.soft_deleted_at = Some(now);
                        record.updated_at = now;
                        self.repo.update(
                            &record,
                            &[RecordField::SoftDeletedAt, RecordField::UpdatedAt],
                        )?;
                    }
                    PurgeMode::Hard => self.repo.delete_by_id(record.id)?,
                }
                removed += 1;
                *purged += 1;
            }

            if fetched < page_size {
                return Ok(());
            }
            // Purged rows drop out of the filter, shifting later rows back
            offset += fetched - removed;
        }
    }

    /// Re-seal every record readable with `old_password` under `new_password`
    pub fn rotate_password(
        &self,
        old_password: &Password,
        new_password: &Password,
        cancel: &Cancellation,
    ) -> Result<u64> {
        RotationEngine::new(&self.codec, self.repo.as_ref(), &self.config.rotation).rotate(
            old_password,
            new_password,
            cancel,
        )
    }

    fn unique_token(&self, length: usize) -> Result<String> {
        let attempts = self.config.tokens.create_attempts;
        for attempt in 1..=attempts {
            let candidate = self.tokens.generate(length)?;
            if self.repo.find_by_token(&candidate)?.is_none() {
                return Ok(candidate);
            }
            debug!(attempt, "generated token already taken, retrying");
        }
        Err(VaultError::TokenCollision { attempts })
    }

    fn any_record(&self, token: &str) -> Result<SecretRecord> {
        self.repo
            .find_by_token(token)?
            .ok_or_else(|| not_found(token))
    }

    fn active_record(&self, token: &str) -> Result<SecretRecord> {
        match self.repo.find_by_token(token)? {
            Some(record) if !record.is_soft_deleted() => Ok(record),
            _ => Err(not_found(token)),
        }
    }
}

fn require_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(VaultError::EmptyToken);
    }
    Ok(())
}

fn require_password(password: &Password) -> Result<()> {
    if password.expose_secret().is_empty() {
        return Err(VaultError::EmptyPassword);
    }
    Ok(())
}

fn not_found(token: &str) -> VaultError {
    VaultError::NotFound {
        token: token.to_string(),
    }
}
