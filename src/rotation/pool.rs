// src/rotation/pool.rs
//! Parallel path: bounded batch queue → fixed workers → result channel
//!
//! The calling thread splits the working set into non-overlapping batches and
//! feeds them through a bounded queue; each record is owned by exactly one
//! worker while it is processed. Workers report per-batch counts on a separate
//! channel. Everything runs inside `thread::scope`, so all workers have
//! finished (or seen the stop signal) before `dispatch` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use tracing::{debug, warn};

use super::RotationEngine;
use crate::aliases::Password;
use crate::cancel::Cancellation;
use crate::error::VaultError;
use crate::record::SecretRecord;

/// How long a blocked queue operation waits before re-checking for a stop
const POLL_INTERVAL: Duration = Duration::from_millis(25);

enum BatchOutcome {
    Done(u64),
    /// `changed` records were committed before `error` stopped the worker
    Failed { changed: u64, error: VaultError },
}

/// Shared view of "should anyone keep working"
struct StopSignal<'a> {
    cancel: &'a Cancellation,
    halted: AtomicBool,
}

impl StopSignal<'_> {
    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.halted.load(Ordering::Acquire)
    }

    fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }
}

pub(super) fn dispatch(
    engine: &RotationEngine<'_>,
    records: Vec<SecretRecord>,
    old_password: &Password,
    new_password: &Password,
    cancel: &Cancellation,
    changed: &mut u64,
) -> Result<(), VaultError> {
    if records.is_empty() {
        return Ok(());
    }
    let config = engine.config;
    let batch_size = config.batch_size;
    let batches = records.len().div_ceil(batch_size);
    let workers = config.workers.min(batches);

    let (work_tx, work_rx) = bounded::<Vec<SecretRecord>>(config.queue_depth);
    let (result_tx, result_rx) = unbounded::<BatchOutcome>();
    let stop = StopSignal {
        cancel,
        halted: AtomicBool::new(false),
    };

    debug!(records = records.len(), batches, workers, "dispatching rotation batches");

    let first_error = thread::scope(|s| {
        for worker_id in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let stop = &stop;
            s.spawn(move || {
                run_worker(
                    worker_id,
                    engine,
                    &work_rx,
                    &result_tx,
                    stop,
                    old_password,
                    new_password,
                )
            });
        }
        // Workers hold the only remaining handles; when they all exit, both
        // channels disconnect
        drop(work_rx);
        drop(result_tx);

        feed(work_tx, records, batch_size, &stop);

        let mut first_error = None;
        for outcome in result_rx.iter() {
            match outcome {
                BatchOutcome::Done(count) => *changed += count,
                BatchOutcome::Failed { changed: count, error } => {
                    *changed += count;
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }
        first_error
    });

    if let Some(error) = first_error {
        return Err(error);
    }
    cancel.check(*changed)
}

/// Split into batches and queue them; stops early on cancel, halt or when no
/// worker is left to receive. Dropping `work_tx` closes the queue.
fn feed(
    work_tx: Sender<Vec<SecretRecord>>,
    records: Vec<SecretRecord>,
    batch_size: usize,
    stop: &StopSignal<'_>,
) {
    let mut records = records.into_iter();
    loop {
        let mut batch: Vec<SecretRecord> = records.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            return;
        }
        loop {
            if stop.should_stop() {
                return;
            }
            match work_tx.send_timeout(batch, POLL_INTERVAL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(returned)) => batch = returned,
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
    }
}

fn run_worker(
    worker_id: usize,
    engine: &RotationEngine<'_>,
    work_rx: &Receiver<Vec<SecretRecord>>,
    result_tx: &Sender<BatchOutcome>,
    stop: &StopSignal<'_>,
    old_password: &Password,
    new_password: &Password,
) {
    loop {
        if stop.should_stop() {
            return;
        }
        let batch = match work_rx.recv_timeout(POLL_INTERVAL) {
            Ok(batch) => batch,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };

        let mut count = 0u64;
        for record in batch {
            if stop.should_stop() {
                break;
            }
            match engine.rotate_record(record, old_password, new_password) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(worker_id, error = %error, "rotation worker failed");
                    stop.halt();
                    let _ = result_tx.send(BatchOutcome::Failed {
                        changed: count,
                        error,
                    });
                    return;
                }
            }
        }
        let _ = result_tx.send(BatchOutcome::Done(count));
    }
}
