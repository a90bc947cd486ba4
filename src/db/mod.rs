// src/db/mod.rs
//! Persistence boundary
//!
//! The vault and the rotation engine only ever talk to storage through
//! [`Repository`]. Two adapters ship with the crate: [`MemoryRepository`] and
//! [`SqliteRepository`]. Each call is assumed atomic for a single record; no
//! cross-record transactions are offered or expected.

mod memory;
mod sqlite_conn;
mod sqlite_ops;

pub use memory::MemoryRepository;
pub use sqlite_conn::SqliteRepository;

use std::sync::Arc;

use uuid::Uuid;

use crate::error::RepositoryError;
use crate::record::{RecordField, SecretRecord};

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Storage operations consumed by the vault and the rotation engine
pub trait Repository: Send + Sync {
    /// Insert a new record; fails with `Duplicate` if the token is taken
    fn create(&self, record: &SecretRecord) -> RepoResult<()>;

    /// Write only `fields` of `record` to the stored row with the same id
    fn update(&self, record: &SecretRecord, fields: &[RecordField]) -> RepoResult<()>;

    fn delete_by_id(&self, id: Uuid) -> RepoResult<()>;

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<SecretRecord>>;

    /// Looks at every record, soft-deleted ones included
    fn find_by_token(&self, token: &str) -> RepoResult<Option<SecretRecord>>;

    fn list(&self, query: &ListQuery) -> RepoResult<Vec<SecretRecord>>;

    fn count(&self, filter: &RecordFilter) -> RepoResult<u64>;
}

impl<R: Repository + ?Sized> Repository for Arc<R> {
    fn create(&self, record: &SecretRecord) -> RepoResult<()> {
        (**self).create(record)
    }

    fn update(&self, record: &SecretRecord, fields: &[RecordField]) -> RepoResult<()> {
        (**self).update(record, fields)
    }

    fn delete_by_id(&self, id: Uuid) -> RepoResult<()> {
        (**self).delete_by_id(id)
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<SecretRecord>> {
        (**self).find_by_id(id)
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<SecretRecord>> {
        (**self).find_by_token(token)
    }

    fn list(&self, query: &ListQuery) -> RepoResult<Vec<SecretRecord>> {
        (**self).list(query)
    }

    fn count(&self, filter: &RecordFilter) -> RepoResult<u64> {
        (**self).count(filter)
    }
}

/// Which records a `list`/`count` call sees
///
/// All set conditions must hold. Soft-deleted records are hidden unless
/// `include_soft_deleted` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub id: Option<Uuid>,
    pub id_in: Option<Vec<Uuid>>,
    pub token: Option<String>,
    pub token_in: Option<Vec<String>>,
    pub include_soft_deleted: bool,
}

impl RecordFilter {
    /// Active records only
    pub fn active() -> Self {
        Self::default()
    }

    /// Every record, soft-deleted ones included
    pub fn everything() -> Self {
        Self {
            include_soft_deleted: true,
            ..Self::default()
        }
    }

    pub fn with_tokens(mut self, tokens: Vec<String>) -> Self {
        self.token_in = Some(tokens);
        self
    }

    pub fn with_ids(mut self, ids: Vec<Uuid>) -> Self {
        self.id_in = Some(ids);
        self
    }

    pub fn matches(&self, record: &SecretRecord) -> bool {
        (self.include_soft_deleted || !record.is_soft_deleted())
            && self.id.is_none_or(|id| record.id == id)
            && self.id_in.as_ref().is_none_or(|ids| ids.contains(&record.id))
            && self.token.as_ref().is_none_or(|t| record.token == *t)
            && self
                .token_in
                .as_ref()
                .is_none_or(|tokens| tokens.contains(&record.token))
    }
}

/// Sort key for `list`; all orders tie-break on `id` so paging is stable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Id,
    CreatedAt,
    Token,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: RecordFilter,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ListQuery {
    pub fn new(filter: RecordFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// One page of `limit` records starting at `offset`, ordered by id
    pub fn page(filter: RecordFilter, offset: usize, limit: usize) -> Self {
        Self {
            filter,
            order_by: Some(OrderBy::Id),
            limit: Some(limit),
            offset,
        }
    }
}
