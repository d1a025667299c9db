//! Retry scheduling with exponential backoff and priority decay.

use tracing::debug;

use super::manager::WorkQueue;
use super::types::{now_ms, Job, Payload, RetryEntry};

impl<T: Payload> WorkQueue<T> {
    /// Backoff delay in ms for the given attempt number (1-based):
    /// `min(retry_delay_ms * backoff_multiplier^(attempt-1), max_delay_ms)`.
    pub(crate) fn backoff_delay(&self, attempt: u32) -> u64 {
        let exp = attempt.saturating_sub(1).min(63);
        let delay =
            self.config.retry_delay_ms as f64 * self.config.backoff_multiplier.powi(exp as i32);
        (delay as u64).min(self.config.max_delay_ms)
    }

    /// Schedule a failed job for a delayed re-attempt.
    ///
    /// The retry list is bounded by `max_queue_size`; past that, the job is
    /// spilled to the overflow file (or dropped when overflow is disabled) so
    /// a storm of failing retries cannot grow memory without bound.
    pub(crate) fn schedule_retry(&self, mut job: Job<T>) {
        job.retries += 1;
        let execute_at = now_ms() + self.backoff_delay(job.retries);

        let job = {
            let mut retries = self.retry_schedule.lock();
            if retries.len() < self.config.max_queue_size {
                retries.insert(RetryEntry { execute_at, job });
                None
            } else {
                Some(job)
            }
        };

        match job {
            None => {
                // The scheduler recomputes its timer from the list head, so
                // inserting an earlier deadline just needs a wake-up.
                self.wake.notify_one();
            }
            Some(job) if self.overflow.is_some() => {
                debug!(job_id = job.id, "retry list full, spilling retry to overflow");
                self.persist_overflow_job(job);
            }
            Some(job) => {
                debug!(job_id = job.id, "retry list full and overflow disabled, dropping job");
                self.metrics.record_drop();
            }
        }
    }

    /// Move every due retry back into the main queue in one batch.
    ///
    /// Due entries are a contiguous prefix of the ascending list. Each job
    /// re-enters at `priority - 1`; jobs that no longer fit in the main queue
    /// overflow or drop by the same rules as enqueue.
    pub(crate) fn flush_due_retries(&self) {
        let due = { self.retry_schedule.lock().take_due(now_ms()) };
        if due.is_empty() {
            return;
        }

        let count = due.len();
        for entry in due {
            let mut job = entry.job;
            job.priority -= 1;
            self.requeue(job);
        }
        debug!(count, "re-enqueued due retries");
        self.wake.notify_one();
    }

    /// Put a retried (or recovered) job back into the main queue, spilling to
    /// overflow when full.
    fn requeue(&self, job: Job<T>) {
        let job = {
            let mut ready = self.ready.lock();
            if ready.len() < self.config.max_queue_size {
                ready.push(job);
                None
            } else {
                Some(job)
            }
        };

        match job {
            None => {}
            Some(job) if self.overflow.is_some() => {
                debug!(job_id = job.id, "main queue full, spilling retried job to overflow");
                self.persist_overflow_job(job);
            }
            Some(job) => {
                debug!(job_id = job.id, "main queue full and overflow disabled, dropping retried job");
                self.metrics.record_drop();
            }
        }
    }
}
