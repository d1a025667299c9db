//! Work queue tests.
//!
//! Shared helpers live here; topic files cover ordering, retry semantics,
//! overflow durability, and concurrency bounds.

mod priority;
mod retry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::{sleep, Duration};

use super::{Job, QueueConfig, WorkQueue};

/// Small config tuned for fast tests.
fn test_config() -> QueueConfig {
    QueueConfig {
        concurrency: 2,
        max_queue_size: 10,
        max_retries: 3,
        retry_delay_ms: 20,
        backoff_multiplier: 2.0,
        max_delay_ms: 100,
        ..QueueConfig::default()
    }
}

/// Queue whose processor records each payload in completion order.
fn recording_queue(config: QueueConfig) -> (Arc<WorkQueue<Value>>, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let queue = WorkQueue::new(config, move |job: Job<Value>| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().push((*job.data).clone());
            Ok(())
        }
    });
    (queue, seen)
}

/// Gate that holds processors until opened, so a test controls when
/// dispatched jobs finish.
#[derive(Clone)]
struct Gate(Arc<AtomicBool>);

impl Gate {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    fn open(&self) {
        self.0.store(true, Ordering::Release);
    }

    async fn wait(&self) {
        while !self.0.load(Ordering::Acquire) {
            sleep(Duration::from_millis(2)).await;
        }
    }
}

/// Poll until the condition holds or a ~2.5s budget runs out.
async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    false
}
