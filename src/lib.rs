//! spillq - bounded, priority-ordered work queue with disk overflow.
//!
//! An in-process queue for buffering write-heavy work on memory-capped
//! deployments: a bounded in-memory priority queue, retry scheduling with
//! exponential backoff and priority decay, and a crash-safe newline-delimited
//! JSON overflow file that absorbs burst load instead of dropping it.

pub mod queue;
pub mod telemetry;

pub use queue::{Job, QueueConfig, QueueStatus, WorkQueue};
