// src/cancel.rs
//! Cooperative cancellation handle
//!
//! Clones share one flag. Long-running operations poll it between records and
//! before blocking queue operations, then stop with the work already done
//! reported in [`VaultError::Cancelled`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::VaultError;

const DEFAULT_REASON: &str = "cancelled by caller";

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    reason: OnceLock<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel_with(DEFAULT_REASON);
    }

    /// Cancel and record why; only the first reason is kept
    pub fn cancel_with(&self, reason: impl Into<String>) {
        let _ = self.inner.reason.set(reason.into());
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<&str> {
        self.inner.reason.get().map(String::as_str)
    }

    /// `Err(Cancelled { processed })` once cancelled
    pub fn check(&self, processed: u64) -> Result<(), VaultError> {
        if self.is_cancelled() {
            return Err(VaultError::Cancelled {
                processed,
                reason: self.reason().unwrap_or(DEFAULT_REASON).to_string(),
            });
        }
        Ok(())
    }
}
