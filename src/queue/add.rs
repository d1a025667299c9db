//! Enqueue operations.

use tracing::{debug, error};

use super::manager::WorkQueue;
use super::types::{Job, Payload};

impl<T: Payload> WorkQueue<T> {
    /// Enqueue a job at the default priority (0).
    pub async fn add(&self, data: T) -> Option<u64> {
        self.add_with_priority(data, 0).await
    }

    /// Enqueue a job; higher priority runs first.
    ///
    /// Returns the job id, or `None` when the queue is full and no overflow
    /// path is configured (the caller must handle the dropped work). With
    /// overflow configured, a full queue spills the job to disk and still
    /// returns the id: the contract is that the job is durably scheduled, not
    /// that it is in memory. Jobs at/above the sync-priority threshold are
    /// flushed to disk before this returns; lower priorities persist in the
    /// background.
    pub async fn add_with_priority(&self, data: T, priority: i32) -> Option<u64> {
        let id = self.next_job_id();
        let job = Job::new(id, data, priority);

        // On insert the job moves into the queue; on overflow it stays out of
        // memory entirely once persisted.
        let job = {
            let mut ready = self.ready.lock();
            if ready.len() < self.config.max_queue_size {
                ready.push(job);
                None
            } else {
                Some(job)
            }
        };

        let Some(job) = job else {
            self.metrics.record_enqueue();
            self.wake.notify_one();
            return Some(id);
        };

        if self.overflow.is_none() {
            debug!(job_id = id, priority, "queue full and overflow disabled, rejecting job");
            return None;
        }

        if priority >= self.config.sync_overflow_priority_threshold {
            if let Err(e) = self.persist_overflow_job_sync(&job).await {
                error!(job_id = id, error = %e, "failed to persist high-priority overflow job");
                return None;
            }
        } else {
            self.persist_overflow_job(job);
        }
        self.metrics.record_enqueue();
        Some(id)
    }

    /// Enqueue a batch; per-item semantics match [`add_with_priority`].
    ///
    /// [`add_with_priority`]: WorkQueue::add_with_priority
    pub async fn add_batch(&self, items: Vec<(T, i32)>) -> Vec<Option<u64>> {
        let mut ids = Vec::with_capacity(items.len());
        for (data, priority) in items {
            ids.push(self.add_with_priority(data, priority).await);
        }
        ids
    }
}
