//! Status snapshots.

use std::sync::atomic::Ordering;

use serde::Serialize;

use super::manager::WorkQueue;
use super::types::Payload;

/// Point-in-time view of the queue, computed on demand and never cached.
///
/// `overflow_persisted` and `overflow_recovered` are cumulative and monotonic
/// under normal operation; the rest are current depths or lifetime totals.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queued: usize,
    pub processing: usize,
    pub retry_pending: usize,
    /// Jobs currently owned by the queue in memory.
    pub total: usize,
    pub enqueued: u64,
    pub completed: u64,
    /// Jobs permanently dropped after exhausting retries.
    pub dropped: u64,
    pub overflow_persisted: u64,
    pub overflow_recovered: u64,
    pub avg_latency_ms: f64,
}

impl<T: Payload> WorkQueue<T> {
    /// Read-only snapshot; no side effects.
    pub fn status(&self) -> QueueStatus {
        let queued = self.ready.lock().len();
        let retry_pending = self.retry_schedule.lock().len();
        let processing = self.metrics.current_processing.load(Ordering::Relaxed);

        let (overflow_persisted, overflow_recovered) = self
            .overflow
            .as_ref()
            .map(|s| (s.persisted_count(), s.recovered_count()))
            .unwrap_or((0, 0));

        QueueStatus {
            queued,
            processing,
            retry_pending,
            total: queued + processing + retry_pending,
            enqueued: self.metrics.total_enqueued.load(Ordering::Relaxed),
            completed: self.metrics.total_completed.load(Ordering::Relaxed),
            dropped: self.metrics.total_dropped.load(Ordering::Relaxed),
            overflow_persisted,
            overflow_recovered,
            avg_latency_ms: self.metrics.avg_latency_ms(),
        }
    }
}
