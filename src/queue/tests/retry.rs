//! Retry backoff, priority decay, give-up, and due-prefix flush tests.

use std::sync::atomic::AtomicUsize;

use serde_json::json;

use super::super::types::{Job, RetryEntry, RetrySchedule};
use super::*;

// ==================== RETRY SCHEDULE (unit) ====================

#[test]
fn test_retry_schedule_ordered_insert() {
    let mut schedule: RetrySchedule<u32> = RetrySchedule::new();
    for (id, at) in [(1u64, 500u64), (2, 100), (3, 300)] {
        schedule.insert(RetryEntry {
            execute_at: at,
            job: Job::new(id, id as u32, 0),
        });
    }
    assert_eq!(schedule.next_due(), Some(100));
    assert_eq!(schedule.len(), 3);
}

#[test]
fn test_retry_flush_is_a_prefix() {
    let t = 1_000_000u64;
    let mut schedule: RetrySchedule<u32> = RetrySchedule::new();
    for (id, at) in [(1u64, t - 3000), (2, t - 2000), (3, t - 1000), (4, t + 5000)] {
        schedule.insert(RetryEntry {
            execute_at: at,
            job: Job::new(id, id as u32, 0),
        });
    }

    let due = schedule.take_due(t);
    assert_eq!(due.len(), 3);
    assert_eq!(
        due.iter().map(|e| e.job.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    // The not-yet-due entry is untouched.
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule.next_due(), Some(t + 5000));
}

#[test]
fn test_retry_flush_nothing_due() {
    let mut schedule: RetrySchedule<u32> = RetrySchedule::new();
    schedule.insert(RetryEntry {
        execute_at: 500,
        job: Job::new(1, 1, 0),
    });
    assert!(schedule.take_due(499).is_empty());
    assert_eq!(schedule.len(), 1);
}

// ==================== BACKOFF ====================

#[tokio::test]
async fn test_backoff_monotonic_and_capped() {
    let queue: Arc<WorkQueue<Value>> = WorkQueue::new(
        QueueConfig {
            retry_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 300,
            ..QueueConfig::default()
        },
        |_job| async { Ok(()) },
    );

    assert_eq!(queue.backoff_delay(1), 100);
    assert_eq!(queue.backoff_delay(2), 200);
    assert_eq!(queue.backoff_delay(3), 300);
    assert_eq!(queue.backoff_delay(4), 300);
    assert_eq!(queue.backoff_delay(10), 300);
    queue.shutdown();
}

// ==================== RETRY BEHAVIOR ====================

#[tokio::test]
async fn test_priority_decay_on_retry() {
    let priorities = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&priorities);
    let queue = WorkQueue::new(test_config(), move |job: Job<Value>| {
        let seen = Arc::clone(&seen);
        async move {
            let attempt = {
                let mut seen = seen.lock();
                seen.push(job.priority);
                seen.len()
            };
            if attempt == 1 {
                Err("transient".to_string())
            } else {
                Ok(())
            }
        }
    });

    queue.add_with_priority(json!("flaky"), 5).await.unwrap();
    assert!(wait_until(|| queue.status().completed == 1).await);

    assert_eq!(priorities.lock().clone(), vec![5, 4]);
    queue.shutdown();
}

#[tokio::test]
async fn test_give_up_after_max_retries() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let queue = WorkQueue::new(
        QueueConfig {
            max_retries: 0,
            ..test_config()
        },
        move |_job: Job<Value>| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("always fails".to_string())
            }
        },
    );

    queue.add(json!("doomed")).await.unwrap();
    assert!(wait_until(|| queue.status().dropped == 1).await);

    // maxRetries = 0: attempted exactly once, never retried.
    sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(queue.status().retry_pending, 0);
    queue.shutdown();
}

#[tokio::test]
async fn test_retries_exhausted_counts_each_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let queue = WorkQueue::new(
        QueueConfig {
            max_retries: 2,
            ..test_config()
        },
        move |_job: Job<Value>| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("always fails".to_string())
            }
        },
    );

    queue.add(json!("doomed")).await.unwrap();
    assert!(wait_until(|| queue.status().dropped == 1).await);
    // Initial attempt plus two retries.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    queue.shutdown();
}

#[tokio::test]
async fn test_job_timeout_feeds_retry_path() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let queue = WorkQueue::new(
        QueueConfig {
            max_retries: 1,
            job_timeout_ms: Some(30),
            ..test_config()
        },
        move |_job: Job<Value>| {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    // First attempt hangs past the timeout.
                    sleep(Duration::from_secs(5)).await;
                }
                Ok(())
            }
        },
    );

    queue.add(json!("slow once")).await.unwrap();
    assert!(wait_until(|| queue.status().completed == 1).await);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    queue.shutdown();
}
