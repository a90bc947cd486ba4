// tests/common.rs
//! Shared test utilities: fast codec params, vault builders and fault injection
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use encrypted_token_vault::db::RepoResult;
use encrypted_token_vault::{
    Cancellation, CodecParams, ListQuery, MemoryRepository, Password, RecordField, RecordFilter,
    Repository, RepositoryError, SecretRecord, TokenVault, VaultConfig,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Initialize test-friendly logging; respects RUST_LOG, safe to call repeatedly
pub fn setup() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Argon2id at its cheapest legal setting, so tests run in milliseconds
pub fn fast_params() -> CodecParams {
    CodecParams {
        iterations: 1,
        memory_kib: 64,
        parallelism: 1,
        ..CodecParams::lightweight()
    }
}

pub fn fast_config() -> VaultConfig {
    VaultConfig::with_codec(fast_params())
}

pub fn pw(password: &str) -> Password {
    Password::new(password.to_string())
}

/// A vault over a fresh in-memory repository; the repository handle is returned too
pub fn memory_vault(config: VaultConfig) -> (TokenVault, Arc<MemoryRepository>) {
    setup();
    let repo = Arc::new(MemoryRepository::new());
    let vault = TokenVault::new(config, repo.clone()).expect("valid test config");
    (vault, repo)
}

/// Store `count` secrets named `"{label}-{i}"` under `password`
pub fn seed(vault: &TokenVault, label: &str, count: usize, password: &Password) -> Vec<String> {
    let cancel = Cancellation::new();
    (0..count)
        .map(|i| {
            vault
                .create_default(&format!("{label}-{i}"), password, None, &cancel)
                .expect("seed secret")
        })
        .collect()
}

/// How many stored records open under `password`
pub fn readable_with(vault: &TokenVault, password: &Password) -> usize {
    vault
        .repository()
        .list(&ListQuery::new(RecordFilter::everything()))
        .expect("list")
        .iter()
        .filter(|record| vault.codec().decode(&record.encrypted_value, password).is_ok())
        .count()
}

/// Repository wrapper that cancels or fails after a number of successful updates
pub struct FaultyRepository {
    inner: MemoryRepository,
    updates: AtomicUsize,
    cancel_after: Option<(usize, Cancellation)>,
    fail_after: Option<usize>,
}

impl FaultyRepository {
    pub fn new() -> Self {
        Self {
            inner: MemoryRepository::new(),
            updates: AtomicUsize::new(0),
            cancel_after: None,
            fail_after: None,
        }
    }

    /// Trip `cancel` right after the `n`-th committed update
    pub fn cancel_after(mut self, n: usize, cancel: Cancellation) -> Self {
        self.cancel_after = Some((n, cancel));
        self
    }

    /// Reject every update once `n` have been committed
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl Repository for FaultyRepository {
    fn create(&self, record: &SecretRecord) -> RepoResult<()> {
        self.inner.create(record)
    }

    fn update(&self, record: &SecretRecord, fields: &[RecordField]) -> RepoResult<()> {
        let committed = self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| committed >= n) {
            self.updates.fetch_sub(1, Ordering::SeqCst);
            return Err(RepositoryError::Corrupt("injected failure".into()));
        }
        self.inner.update(record, fields)?;
        if let Some((n, cancel)) = &self.cancel_after {
            if committed + 1 == *n {
                cancel.cancel_with("test cancellation");
            }
        }
        Ok(())
    }

    fn delete_by_id(&self, id: Uuid) -> RepoResult<()> {
        self.inner.delete_by_id(id)
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<SecretRecord>> {
        self.inner.find_by_id(id)
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<SecretRecord>> {
        self.inner.find_by_token(token)
    }

    fn list(&self, query: &ListQuery) -> RepoResult<Vec<SecretRecord>> {
        self.inner.list(query)
    }

    fn count(&self, filter: &RecordFilter) -> RepoResult<u64> {
        self.inner.count(filter)
    }
}
