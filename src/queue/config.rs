//! Queue configuration.

use std::path::PathBuf;

/// Work queue configuration.
///
/// Every field has a default; values are validated only by type. Degenerate
/// values produce degenerate behavior (`concurrency = 0` stalls dispatch,
/// `max_queue_size = 0` overflows or rejects every job) rather than errors.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Max simultaneously in-flight processor invocations.
    pub concurrency: usize,
    /// Upper bound on the in-memory main queue; also bounds the retry list.
    pub max_queue_size: usize,
    /// Failed attempts allowed beyond the first before a job is dropped.
    pub max_retries: u32,
    /// Initial backoff unit in ms.
    pub retry_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Backoff ceiling in ms.
    pub max_delay_ms: u64,
    /// Overflow file path; `None` disables overflow and a full queue rejects
    /// new work.
    pub overflow_file_path: Option<PathBuf>,
    /// Jobs at/above this priority are persisted to the overflow file
    /// synchronously when the queue is full, shrinking the crash window for
    /// urgent work.
    pub sync_overflow_priority_threshold: i32,
    /// Per-job processing timeout in ms; expiry counts as a failure and feeds
    /// the retry path. `None` disables (a slow processor holds its slot).
    pub job_timeout_ms: Option<u64>,
    /// Periodic overflow recovery interval in ms. Recovery always also runs
    /// opportunistically when the queue has slack; `None` means
    /// opportunistic-only.
    pub recovery_interval_ms: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_queue_size: 100,
            max_retries: 3,
            retry_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            overflow_file_path: None,
            sync_overflow_priority_threshold: 10,
            job_timeout_ms: None,
            recovery_interval_ms: None,
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            concurrency: env_parse("SPILLQ_CONCURRENCY", defaults.concurrency),
            max_queue_size: env_parse("SPILLQ_MAX_QUEUE_SIZE", defaults.max_queue_size),
            max_retries: env_parse("SPILLQ_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_parse("SPILLQ_RETRY_DELAY_MS", defaults.retry_delay_ms),
            backoff_multiplier: env_parse("SPILLQ_BACKOFF_MULTIPLIER", defaults.backoff_multiplier),
            max_delay_ms: env_parse("SPILLQ_MAX_DELAY_MS", defaults.max_delay_ms),
            overflow_file_path: std::env::var("SPILLQ_OVERFLOW_PATH").ok().map(PathBuf::from),
            sync_overflow_priority_threshold: env_parse(
                "SPILLQ_SYNC_OVERFLOW_PRIORITY",
                defaults.sync_overflow_priority_threshold,
            ),
            job_timeout_ms: env_parse_opt("SPILLQ_JOB_TIMEOUT_MS"),
            recovery_interval_ms: env_parse_opt("SPILLQ_RECOVERY_INTERVAL_MS"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parse_opt<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}
