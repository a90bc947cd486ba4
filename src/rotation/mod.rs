// src/rotation/mod.rs
//! Bulk password rotation
//!
//! No record says which password sealed it, so membership is decided by
//! trying: every record that opens under the old password is re-sealed under
//! the new one and written back (`encrypted_value` + `updated_at` only);
//! everything else is skipped.
//!
//! Large tables are walked in id-ordered pages; large corpora are fanned out to
//! a fixed worker pool (see [`pool`]). There is no rollback: a rotation that
//! stops early leaves a mix of old and new passwords, and the error reports
//! how many records were already moved.

mod pool;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aliases::Password;
use crate::cancel::Cancellation;
use crate::config::RotationConfig;
use crate::crypto::Codec;
use crate::db::{ListQuery, RecordFilter, Repository};
use crate::enums::ExecutionMode;
use crate::error::VaultError;
use crate::record::{RecordField, SecretRecord};

/// How a rotation over `total` records will run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPlan {
    pub total: u64,
    pub mode: ExecutionMode,
    /// Walk the table page by page instead of loading it whole
    pub paged: bool,
}

pub struct RotationEngine<'a> {
    codec: &'a Codec,
    repo: &'a dyn Repository,
    config: &'a RotationConfig,
}

impl<'a> RotationEngine<'a> {
    pub fn new(codec: &'a Codec, repo: &'a dyn Repository, config: &'a RotationConfig) -> Self {
        Self {
            codec,
            repo,
            config,
        }
    }

    pub fn plan(&self, total: u64) -> RotationPlan {
        let exceeds = |threshold: usize| total > threshold as u64;
        RotationPlan {
            total,
            mode: if exceeds(self.config.parallel_threshold) {
                ExecutionMode::Parallel
            } else {
                ExecutionMode::Sequential
            },
            paged: exceeds(self.config.paging_threshold),
        }
    }

    /// Re-encrypt every record sealed with `old_password` under `new_password`
    ///
    /// Returns the number of records changed. On cancellation or failure the
    /// error carries that number too ([`VaultError::processed`]).
    pub fn rotate(
        &self,
        old_password: &Password,
        new_password: &Password,
        cancel: &Cancellation,
    ) -> Result<u64, VaultError> {
        if old_password.expose_secret().is_empty() || new_password.expose_secret().is_empty() {
            return Err(VaultError::EmptyPassword);
        }
        cancel.check(0)?;

        let total = self.repo.count(&RecordFilter::everything())?;
        if total == 0 {
            debug!("rotation: no records");
            return Ok(0);
        }

        let plan = self.plan(total);
        info!(total, mode = ?plan.mode, paged = plan.paged, "starting password rotation");

        let mut changed = 0u64;
        let outcome = if plan.paged {
            self.rotate_paged(plan.mode, old_password, new_password, cancel, &mut changed)
        } else {
            self.repo
                .list(&ListQuery::new(RecordFilter::everything()))
                .map_err(VaultError::from)
                .and_then(|records| {
                    self.rotate_set(
                        plan.mode,
                        records,
                        old_password,
                        new_password,
                        cancel,
                        &mut changed,
                    )
                })
        };

        match outcome {
            Ok(()) => {
                info!(changed, total, "password rotation finished");
                Ok(changed)
            }
            Err(error) => {
                warn!(changed, error = %error, "password rotation stopped early");
                Err(error.with_progress(changed))
            }
        }
    }

    fn rotate_paged(
        &self,
        mode: ExecutionMode,
        old_password: &Password,
        new_password: &Password,
        cancel: &Cancellation,
        changed: &mut u64,
    ) -> Result<(), VaultError> {
        let page_size = self.config.page_size;
        let mut offset = 0usize;
        loop {
            cancel.check(*changed)?;
            let page = self
                .repo
                .list(&ListQuery::page(RecordFilter::everything(), offset, page_size))?;
            let fetched = page.len();

            self.rotate_set(mode, page, old_password, new_password, cancel, changed)?;
            debug!(offset, fetched, changed = *changed, "rotation page done");

            // Only encrypted_value changes, so offsets stay stable across pages
            if fetched < page_size {
                return Ok(());
            }
            offset += fetched;
        }
    }

    /// Process one bounded working set
    fn rotate_set(
        &self,
        mode: ExecutionMode,
        records: Vec<SecretRecord>,
        old_password: &Password,
        new_password: &Password,
        cancel: &Cancellation,
        changed: &mut u64,
    ) -> Result<(), VaultError> {
        match mode {
            ExecutionMode::Sequential => {
                for record in records {
                    cancel.check(*changed)?;
                    if self.rotate_record(record, old_password, new_password)? {
                        *changed += 1;
                    }
                }
                Ok(())
            }
            ExecutionMode::Parallel => {
                pool::dispatch(self, records, old_password, new_password, cancel, changed)
            }
        }
    }

    /// `Ok(true)` if the record was re-sealed and written back
    fn rotate_record(
        &self,
        mut record: SecretRecord,
        old_password: &Password,
        new_password: &Password,
    ) -> Result<bool, VaultError> {
        let Some(blob) = self
            .codec
            .reencrypt(&record.encrypted_value, old_password, new_password)
            .map_err(VaultError::Encoding)?
        else {
            return Ok(false);
        };

        record.encrypted_value = blob;
        record.updated_at = Utc::now();
        self.repo
            .update(&record, &[RecordField::EncryptedValue, RecordField::UpdatedAt])?;
        Ok(true)
    }
}
