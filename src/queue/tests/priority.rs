//! Priority ordering and FIFO tie-break tests.

use serde_json::json;

use super::super::types::{Job, ReadyQueue};
use super::*;

// ==================== READY QUEUE (unit) ====================

#[test]
fn test_ready_queue_priority_order() {
    let mut q: ReadyQueue<&str> = ReadyQueue::new();
    q.push(Job::new(1, "low", 0));
    q.push(Job::new(2, "high", 10));
    q.push(Job::new(3, "medium", 5));

    assert_eq!(*q.pop().unwrap().data, "high");
    assert_eq!(*q.pop().unwrap().data, "medium");
    assert_eq!(*q.pop().unwrap().data, "low");
    assert!(q.pop().is_none());
}

#[test]
fn test_ready_queue_negative_priority() {
    let mut q: ReadyQueue<&str> = ReadyQueue::new();
    q.push(Job::new(1, "sunk", -10));
    q.push(Job::new(2, "default", 0));
    q.push(Job::new(3, "urgent", 10));

    assert_eq!(q.pop().unwrap().priority, 10);
    assert_eq!(q.pop().unwrap().priority, 0);
    assert_eq!(q.pop().unwrap().priority, -10);
}

#[test]
fn test_ready_queue_fifo_among_equal_priority() {
    let mut q: ReadyQueue<u32> = ReadyQueue::new();
    for id in 1..=5 {
        q.push(Job::new(id, id as u32, 0));
    }
    for id in 1..=5 {
        assert_eq!(q.pop().unwrap().id, id);
    }
}

#[test]
fn test_ready_queue_clear() {
    let mut q: ReadyQueue<u32> = ReadyQueue::new();
    q.push(Job::new(1, 1, 0));
    q.push(Job::new(2, 2, 3));
    assert_eq!(q.len(), 2);
    q.clear();
    assert!(q.is_empty());
    assert!(q.pop().is_none());
}

// ==================== END TO END ====================

#[tokio::test]
async fn test_priority_ordering() {
    let gate = Gate::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let g = gate.clone();
    let queue = WorkQueue::new(
        QueueConfig {
            concurrency: 1,
            ..test_config()
        },
        move |job: Job<Value>| {
            let sink = Arc::clone(&sink);
            let gate = g.clone();
            async move {
                gate.wait().await;
                sink.lock().push((*job.data).clone());
                Ok(())
            }
        },
    );

    // The blocker occupies the single slot while the rest are enqueued, so
    // dequeue order is decided purely by priority.
    queue.add_with_priority(json!("blocker"), 100).await.unwrap();
    wait_until(|| queue.status().processing == 1).await;

    queue.add_with_priority(json!("low"), 0).await.unwrap();
    queue.add_with_priority(json!("high"), 10).await.unwrap();
    queue.add_with_priority(json!("medium"), 5).await.unwrap();

    gate.open();
    assert!(wait_until(|| queue.status().completed == 4).await);

    let order = seen.lock().clone();
    assert_eq!(
        order,
        vec![json!("blocker"), json!("high"), json!("medium"), json!("low")]
    );
    queue.shutdown();
}

#[tokio::test]
async fn test_fifo_same_priority() {
    let gate = Gate::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let g = gate.clone();
    let queue = WorkQueue::new(
        QueueConfig {
            concurrency: 1,
            ..test_config()
        },
        move |job: Job<Value>| {
            let sink = Arc::clone(&sink);
            let gate = g.clone();
            async move {
                gate.wait().await;
                sink.lock().push((*job.data).clone());
                Ok(())
            }
        },
    );

    queue.add_with_priority(json!("blocker"), 100).await.unwrap();
    wait_until(|| queue.status().processing == 1).await;

    for i in 1..=3 {
        queue.add(json!(i)).await.unwrap();
    }

    gate.open();
    assert!(wait_until(|| queue.status().completed == 4).await);

    let order = seen.lock().clone();
    assert_eq!(order[1..], [json!(1), json!(2), json!(3)]);
    queue.shutdown();
}
