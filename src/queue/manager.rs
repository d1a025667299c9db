//! Core WorkQueue struct and constructor.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::info;

use super::config::QueueConfig;
use super::overflow::OverflowStore;
use super::types::{Job, Payload, QueueMetrics, ReadyQueue, RetrySchedule};

/// Boxed future returned by a processor invocation.
pub type ProcessorFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// Caller-supplied async job handler. An `Err` (or a timeout, when
/// configured) counts as a transient failure and feeds the retry path.
pub(crate) type Processor<T> = Arc<dyn Fn(Job<T>) -> ProcessorFuture + Send + Sync>;

/// Bounded, priority-ordered work queue with retry backoff and disk overflow.
///
/// A job is owned by exactly one of: the main queue, an in-flight processor
/// invocation, the retry schedule, or the overflow file. Every transition
/// removes it from the source before adding it to the destination.
pub struct WorkQueue<T> {
    pub(crate) config: QueueConfig,
    pub(crate) processor: Processor<T>,
    pub(crate) ready: Mutex<ReadyQueue<T>>,
    pub(crate) retry_schedule: Mutex<RetrySchedule<T>>,
    pub(crate) overflow: Option<Arc<OverflowStore>>,
    pub(crate) metrics: QueueMetrics,
    /// Wakes the scheduler loop after enqueue/completion/retry transitions.
    pub(crate) wake: Notify,
    id_counter: AtomicU64,
    /// Guards against concurrent overflow recovery passes.
    pub(crate) recovering: AtomicBool,
    shutdown_flag: AtomicBool,
}

impl<T: Payload> WorkQueue<T> {
    /// Create a queue and start its scheduler task.
    ///
    /// The processor is fixed at construction; there is no registration slot
    /// to race against, so a dequeued job always has a handler.
    pub fn new<F, Fut>(config: QueueConfig, processor: F) -> Arc<Self>
    where
        F: Fn(Job<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let processor: Processor<T> =
            Arc::new(move |job| -> ProcessorFuture { Box::pin(processor(job)) });
        let overflow = config
            .overflow_file_path
            .clone()
            .map(|path| Arc::new(OverflowStore::new(path)));

        let queue = Arc::new(Self {
            config,
            processor,
            ready: Mutex::new(ReadyQueue::new()),
            retry_schedule: Mutex::new(RetrySchedule::new()),
            overflow,
            metrics: QueueMetrics::new(),
            wake: Notify::new(),
            id_counter: AtomicU64::new(1),
            recovering: AtomicBool::new(false),
            shutdown_flag: AtomicBool::new(false),
        });

        let q = Arc::clone(&queue);
        tokio::spawn(async move {
            q.scheduler_loop().await;
        });

        if let Some(ref store) = queue.overflow {
            if store.needs_recovery() {
                info!("overflow file has pending jobs, recovery will run on start");
            }
        }

        queue
    }

    /// Allocate the next process-unique job id.
    #[inline]
    pub(crate) fn next_job_id(&self) -> u64 {
        self.id_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Empty the main queue and the retry schedule.
    ///
    /// The overflow file and cumulative counters are left untouched; this is
    /// an operator action, not part of the queue's autonomous behavior.
    pub fn clear(&self) {
        let dropped_ready = {
            let mut ready = self.ready.lock();
            let n = ready.len();
            ready.clear();
            n
        };
        let dropped_retries = {
            let mut retries = self.retry_schedule.lock();
            let n = retries.len();
            retries.clear();
            n
        };
        info!(
            queued = dropped_ready,
            retry_pending = dropped_retries,
            "queue cleared"
        );
        self.wake.notify_one();
    }

    /// Signal the scheduler task to stop. In-flight jobs run to completion.
    pub fn shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        self.wake.notify_one();
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn has_overflow(&self) -> bool {
        self.overflow.is_some()
    }
}
