//! Overflow persistence wrappers and the recovery pass.
//!
//! Nothing here propagates to external callers: the async paths absorb
//! failures into logs, and the recovery loop reports through counters.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{error, info};

use super::manager::WorkQueue;
use super::overflow::OverflowError;
use super::types::{Job, OverflowRecord, Payload};

impl<T: Payload> WorkQueue<T> {
    /// Persist a job to the overflow file, awaiting the flushed write.
    ///
    /// Used for high-priority overflow to minimize the crash window.
    pub(crate) async fn persist_overflow_job_sync(&self, job: &Job<T>) -> Result<(), OverflowError> {
        let Some(ref store) = self.overflow else {
            return Ok(());
        };
        let line = serde_json::to_string(&OverflowRecord::from_job(job))?;
        let store = Arc::clone(store);
        tokio::task::spawn_blocking(move || store.append(&line))
            .await
            .map_err(|e| OverflowError::Other(e.to_string()))?
    }

    /// Persist a job to the overflow file without blocking the caller.
    /// Errors are logged, not propagated.
    pub(crate) fn persist_overflow_job(&self, job: Job<T>) {
        let Some(ref store) = self.overflow else {
            return;
        };
        let line = match serde_json::to_string(&OverflowRecord::from_job(&job)) {
            Ok(line) => line,
            Err(e) => {
                error!(job_id = job.id, error = %e, "failed to serialize overflow job");
                return;
            }
        };
        let store = Arc::clone(store);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = store.append(&line) {
                error!(job_id = job.id, error = %e, "failed to persist overflow job");
            }
        });
    }

    /// Reclaim persisted jobs into the main queue, up to available capacity.
    ///
    /// Skips entirely when the file is clean, a pass is already running, or
    /// the main queue has no slack. The remainder that does not fit is
    /// rewritten back to the file, never lost.
    pub(crate) async fn recover_overflow_jobs(&self) {
        let Some(ref store) = self.overflow else {
            return;
        };
        if !store.needs_recovery() {
            return;
        }
        if self
            .recovering
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let slack = {
            let ready = self.ready.lock();
            self.config.max_queue_size.saturating_sub(ready.len())
        };
        if slack == 0 {
            self.recovering.store(false, Ordering::Release);
            return;
        }

        let drain_store = Arc::clone(store);
        let result = tokio::task::spawn_blocking(move || drain_store.drain::<T>(slack)).await;

        match result {
            Ok(Ok(records)) if !records.is_empty() => {
                let count = records.len();
                {
                    let mut ready = self.ready.lock();
                    for record in records {
                        ready.push(record.into_job(self.next_job_id()));
                    }
                }
                info!(count, "recovered overflow jobs");
                self.wake.notify_one();
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!(error = %e, "overflow recovery failed"),
            Err(e) => error!(error = %e, "overflow recovery task failed"),
        }

        self.recovering.store(false, Ordering::Release);
    }
}
