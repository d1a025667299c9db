//! Scheduler loop: the queue's single background task.
//!
//! Each iteration ticks the dispatcher, opportunistically recovers overflow
//! when the queue has slack, then sleeps until whichever comes first: a
//! wake-up (enqueue, completion, retry armed, clear, shutdown), the earliest
//! retry deadline, or the periodic recovery interval when configured. The
//! retry timer is a single logical timer recomputed from the list head every
//! iteration, so re-arming is idempotent and cannot leak.

use std::sync::Arc;

use tokio::time::{interval, sleep, Duration};
use tracing::info;

use super::manager::WorkQueue;
use super::types::{now_ms, Payload};

impl<T: Payload> WorkQueue<T> {
    pub(crate) async fn scheduler_loop(self: Arc<Self>) {
        // The ticker exists even when periodic recovery is off; the branch
        // below is disabled then and the future is never polled.
        let mut recovery_ticker = interval(Duration::from_millis(
            self.config.recovery_interval_ms.unwrap_or(3_600_000).max(1),
        ));
        let periodic_recovery =
            self.config.recovery_interval_ms.is_some() && self.overflow.is_some();

        info!("queue scheduler started");

        loop {
            if self.is_shutdown() {
                info!("queue scheduler stopped");
                return;
            }

            self.tick();

            // Opportunistic recovery: whenever the file is dirty and the
            // main queue has room, drain a batch back into memory.
            self.recover_overflow_jobs().await;
            self.tick();

            let next_due = { self.retry_schedule.lock().next_due() };
            let retry_sleep =
                Duration::from_millis(next_due.unwrap_or(0).saturating_sub(now_ms()));

            tokio::select! {
                _ = self.wake.notified() => {}
                _ = sleep(retry_sleep), if next_due.is_some() => {
                    self.flush_due_retries();
                }
                _ = recovery_ticker.tick(), if periodic_recovery => {
                    self.recover_overflow_jobs().await;
                }
            }
        }
    }
}
