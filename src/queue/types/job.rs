//! Job container and its on-disk overflow form.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::time::now_ms;

/// Bounds required of a job payload: serializable for the overflow file,
/// sendable across the tasks that process it.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// One unit of work.
///
/// Payload data is wrapped in `Arc` for cheap cloning between the queue and
/// the in-flight processor invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Job<T> {
    pub id: u64,
    pub data: Arc<T>,
    /// Higher runs first. Decremented each time the job re-enters the main
    /// queue after a retry, so repeatedly failing work yields to fresh work.
    pub priority: i32,
    /// Attempts that have already failed.
    pub retries: u32,
    /// Enqueue timestamp (epoch ms), preserved across retries and overflow
    /// round-trips.
    pub created_at: u64,
}

impl<T> Job<T> {
    pub(crate) fn new(id: u64, data: T, priority: i32) -> Self {
        Self {
            id,
            data: Arc::new(data),
            priority,
            retries: 0,
            created_at: now_ms(),
        }
    }
}

impl<T> Clone for Job<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            data: Arc::clone(&self.data),
            priority: self.priority,
            retries: self.retries,
            created_at: self.created_at,
        }
    }
}

/// Serialized form of a job in the overflow file: one JSON object per line.
///
/// `priority` and `data` are required; everything else defaults so the
/// recovery pass stays backward-readable. Unknown extra fields are tolerated.
/// Job ids are not persisted - a recovered job gets a fresh id, since ids are
/// only unique within one process lifetime.
#[derive(Debug, Serialize, Deserialize)]
pub struct OverflowRecord<T> {
    pub priority: i32,
    pub data: Arc<T>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "now_ms")]
    pub created_at: u64,
}

impl<T> OverflowRecord<T> {
    pub fn from_job(job: &Job<T>) -> Self {
        Self {
            priority: job.priority,
            data: Arc::clone(&job.data),
            retries: job.retries,
            created_at: job.created_at,
        }
    }

    /// Rebuild an in-memory job under a freshly allocated id.
    pub fn into_job(self, id: u64) -> Job<T> {
        Job {
            id,
            data: self.data,
            priority: self.priority,
            retries: self.retries,
            created_at: self.created_at,
        }
    }
}
