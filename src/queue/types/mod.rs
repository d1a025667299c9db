//! Type definitions for the work queue.
//!
//! Module organization:
//! - `job.rs` - Job payload container and overflow record format
//! - `ready_queue.rs` - Priority-ordered main queue (max-heap, FIFO ties)
//! - `retry_schedule.rs` - Ascending-by-due-time retry list
//! - `metrics.rs` - Atomic lifecycle counters
//! - `time.rs` - Epoch-millisecond timestamps

mod job;
mod metrics;
mod ready_queue;
mod retry_schedule;
mod time;

pub use job::{Job, OverflowRecord, Payload};
pub use metrics::QueueMetrics;
pub use ready_queue::ReadyQueue;
pub use retry_schedule::{RetryEntry, RetrySchedule};
pub use time::now_ms;
