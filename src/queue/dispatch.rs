//! Dispatch: filling concurrency slots from the main queue.
//!
//! Cooperative scheduling on the tokio runtime - "N in flight" means N
//! spawned processor futures interleaving at their await points, not OS
//! threads. Dequeue order is descending priority, FIFO among equals.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::time::{timeout, Duration};
use tracing::warn;

use super::manager::WorkQueue;
use super::types::{now_ms, Job, Payload};

impl<T: Payload> WorkQueue<T> {
    /// One pass of the dispatch loop: start jobs until the concurrency limit
    /// or the main queue is exhausted.
    pub(crate) fn tick(self: &Arc<Self>) {
        loop {
            if self.is_shutdown() {
                return;
            }

            // Reserve the slot before popping so concurrent completions and
            // this loop cannot overshoot the concurrency bound.
            let slot = self.metrics.current_processing.fetch_add(1, Ordering::AcqRel);
            if slot >= self.config.concurrency {
                self.metrics.current_processing.fetch_sub(1, Ordering::AcqRel);
                return;
            }

            let job = { self.ready.lock().pop() };
            let Some(job) = job else {
                self.metrics.current_processing.fetch_sub(1, Ordering::AcqRel);
                return;
            };

            let queue = Arc::clone(self);
            tokio::spawn(async move {
                queue.run_job(job).await;
            });
        }
    }

    /// Run one processor invocation to completion and route the outcome.
    async fn run_job(self: Arc<Self>, job: Job<T>) {
        let outcome = match self.config.job_timeout_ms {
            Some(ms) => match timeout(Duration::from_millis(ms), (self.processor)(job.clone())).await
            {
                Ok(result) => result,
                Err(_) => Err(format!("processor timed out after {}ms", ms)),
            },
            None => (self.processor)(job.clone()).await,
        };

        self.metrics.current_processing.fetch_sub(1, Ordering::AcqRel);

        match outcome {
            Ok(()) => {
                self.metrics
                    .record_complete(now_ms().saturating_sub(job.created_at));
            }
            Err(error) => {
                if job.retries < self.config.max_retries {
                    warn!(job_id = job.id, retries = job.retries, error = %error, "job failed, scheduling retry");
                    self.schedule_retry(job);
                } else {
                    warn!(job_id = job.id, retries = job.retries, error = %error, "job failed permanently, dropping");
                    self.metrics.record_drop();
                }
            }
        }

        // Capacity freed (or a retry armed) - let the scheduler make progress.
        self.wake.notify_one();
    }
}
