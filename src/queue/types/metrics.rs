//! Atomic lifecycle counters.
//!
//! Updated on every job transition so status reads stay O(1); queue and
//! retry-list depths are read from the owning structures instead, since a
//! status snapshot is computed on demand, never cached.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub struct QueueMetrics {
    pub total_enqueued: AtomicU64,
    pub total_completed: AtomicU64,
    /// Jobs permanently dropped after exhausting retries (or with nowhere to
    /// spill).
    pub total_dropped: AtomicU64,
    pub current_processing: AtomicUsize,
    pub latency_sum: AtomicU64,
    pub latency_count: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self {
            total_enqueued: AtomicU64::new(0),
            total_completed: AtomicU64::new(0),
            total_dropped: AtomicU64::new(0),
            current_processing: AtomicUsize::new(0),
            latency_sum: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn record_enqueue(&self) {
        self.total_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_complete(&self, latency_ms: u64) {
        self.total_completed.fetch_add(1, Ordering::Relaxed);
        self.latency_sum.fetch_add(latency_ms, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_drop(&self) {
        self.total_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Average processing latency in ms since startup.
    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.latency_sum.load(Ordering::Relaxed) as f64 / count as f64
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}
