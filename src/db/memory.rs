// src/db/memory.rs
//! In-process repository: a `BTreeMap` keyed by id plus a token index

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::{ListQuery, OrderBy, RecordFilter, RepoResult, Repository};
use crate::error::RepositoryError;
use crate::record::{RecordField, SecretRecord};

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<Uuid, SecretRecord>,
    tokens: HashMap<String, Uuid>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| RepositoryError::Poisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| RepositoryError::Poisoned)
    }
}

impl Repository for MemoryRepository {
    fn create(&self, record: &SecretRecord) -> RepoResult<()> {
        let mut tables = self.write()?;
        if tables.tokens.contains_key(&record.token) || tables.rows.contains_key(&record.id) {
            return Err(RepositoryError::Duplicate {
                token: record.token.clone(),
            });
        }
        tables.tokens.insert(record.token.clone(), record.id);
        tables.rows.insert(record.id, record.clone());
        Ok(())
    }

    fn update(&self, record: &SecretRecord, fields: &[RecordField]) -> RepoResult<()> {
        let mut tables = self.write()?;
        let stored = tables
            .rows
            .get_mut(&record.id)
            .ok_or(RepositoryError::MissingId(record.id))?;

        for field in fields {
            match field {
                RecordField::EncryptedValue => {
                    stored.encrypted_value.clone_from(&record.encrypted_value)
                }
                RecordField::UpdatedAt => stored.updated_at = record.updated_at,
                RecordField::ExpiresAt => stored.expires_at = record.expires_at,
                RecordField::SoftDeletedAt => stored.soft_deleted_at = record.soft_deleted_at,
            }
        }
        Ok(())
    }

    fn delete_by_id(&self, id: Uuid) -> RepoResult<()> {
        let mut tables = self.write()?;
        let removed = tables
            .rows
            .remove(&id)
            .ok_or(RepositoryError::MissingId(id))?;
        tables.tokens.remove(&removed.token);
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<SecretRecord>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<SecretRecord>> {
        let tables = self.read()?;
        Ok(tables
            .tokens
            .get(token)
            .and_then(|id| tables.rows.get(id))
            .cloned())
    }

    fn list(&self, query: &ListQuery) -> RepoResult<Vec<SecretRecord>> {
        let tables = self.read()?;
        // BTreeMap iteration is already id order
        let mut matched: Vec<&SecretRecord> = tables
            .rows
            .values()
            .filter(|record| query.filter.matches(record))
            .collect();

        match query.order_by.unwrap_or_default() {
            OrderBy::Id => {}
            OrderBy::CreatedAt => matched.sort_by_key(|r| (r.created_at, r.id)),
            OrderBy::Token => matched.sort_by(|a, b| a.token.cmp(&b.token).then(a.id.cmp(&b.id))),
        }

        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn count(&self, filter: &RecordFilter) -> RepoResult<u64> {
        let tables = self.read()?;
        let count = tables.rows.values().filter(|r| filter.matches(r)).count();
        Ok(count as u64)
    }
}
