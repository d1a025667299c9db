//! Disk overflow store.
//!
//! Jobs that cannot fit in the bounded in-memory queue are appended to a
//! newline-delimited JSON file, one record per line, and reclaimed later by
//! the recovery pass. All file mutations are serialized by an in-process
//! mutex plus a sentinel lock file at `<path>.lock`; a lock file left behind
//! by a crashed process is reclaimed once its mtime is older than
//! `LOCK_STALE_MS`. The lock is advisory and assumes single-process ownership
//! of the overflow path.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::types::OverflowRecord;

/// Age after which a leftover lock file is considered stale and removed.
const LOCK_STALE_MS: u64 = 30_000;
/// Delay between lock acquisition attempts.
const LOCK_RETRY_DELAY_MS: u64 = 10;
/// Attempts before giving up on the lock (~1s).
const LOCK_MAX_ATTEMPTS: u32 = 100;

/// Overflow store error type.
#[derive(Debug)]
pub enum OverflowError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    /// Could not acquire the sentinel lock file within the retry budget.
    LockTimeout(PathBuf),
    Other(String),
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowError::Io(e) => write!(f, "I/O error: {}", e),
            OverflowError::Serialize(e) => write!(f, "serialization error: {}", e),
            OverflowError::LockTimeout(p) => {
                write!(f, "timed out acquiring overflow lock {}", p.display())
            }
            OverflowError::Other(e) => write!(f, "overflow error: {}", e),
        }
    }
}

impl std::error::Error for OverflowError {}

impl From<std::io::Error> for OverflowError {
    fn from(e: std::io::Error) -> Self {
        OverflowError::Io(e)
    }
}

impl From<serde_json::Error> for OverflowError {
    fn from(e: serde_json::Error) -> Self {
        OverflowError::Serialize(e)
    }
}

/// Sentinel lock file, removed on drop.
struct OverflowLock {
    path: PathBuf,
}

impl OverflowLock {
    fn acquire(path: &Path) -> Result<Self, OverflowError> {
        for _ in 0..LOCK_MAX_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if lock_is_stale(path) {
                        warn!(path = %path.display(), "removing stale overflow lock");
                        let _ = fs::remove_file(path);
                        continue;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(LOCK_RETRY_DELAY_MS));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(OverflowError::LockTimeout(path.to_path_buf()))
    }
}

impl Drop for OverflowLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn lock_is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|mtime| mtime.elapsed().ok())
        .map(|age| age.as_millis() as u64 > LOCK_STALE_MS)
        .unwrap_or(false)
}

pub struct OverflowStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// Serializes overflow operations within this process, so sentinel-file
    /// contention only ever happens against a crashed predecessor.
    io_lock: Mutex<()>,
    /// Cumulative jobs persisted; monotonic under normal operation.
    persisted: AtomicU64,
    /// Cumulative jobs recovered; monotonic under normal operation.
    recovered: AtomicU64,
    /// The file may contain unrecovered records.
    dirty: AtomicBool,
}

impl OverflowStore {
    pub fn new(path: PathBuf) -> Self {
        let lock_path = lock_path_for(&path);
        // Records left behind by a previous process are picked up on start.
        let has_pending = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        Self {
            path,
            lock_path,
            io_lock: Mutex::new(()),
            persisted: AtomicU64::new(0),
            recovered: AtomicU64::new(0),
            dirty: AtomicBool::new(has_pending),
        }
    }

    /// Append one serialized record, flushed to disk before returning.
    pub fn append(&self, line: &str) -> Result<(), OverflowError> {
        let _io = self.io_lock.lock();
        let _lock = OverflowLock::acquire(&self.lock_path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;

        self.persisted.fetch_add(1, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Read the whole file, take up to `max` valid records, and atomically
    /// rewrite the remainder.
    ///
    /// Malformed lines (invalid JSON, missing required fields) are skipped
    /// with a warning and discarded; valid lines beyond `max` are kept
    /// verbatim so unrecovered work is never lost.
    pub fn drain<T: DeserializeOwned>(
        &self,
        max: usize,
    ) -> Result<Vec<OverflowRecord<T>>, OverflowError> {
        let _io = self.io_lock.lock();
        let _lock = OverflowLock::acquire(&self.lock_path)?;

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.dirty.store(false, Ordering::Release);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut remainder: Vec<&str> = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if records.len() >= max {
                remainder.push(line);
                continue;
            }
            match serde_json::from_str::<OverflowRecord<T>>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!(line = idx + 1, error = %e, "skipping malformed overflow record");
                }
            }
        }

        if remainder.is_empty() {
            if let Err(e) = fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
            self.dirty.store(false, Ordering::Release);
        } else {
            // Rewrite via temp file + rename so a crash mid-rewrite never
            // truncates the remainder.
            let tmp = self.path.with_extension("overflow.tmp");
            {
                let mut file = fs::File::create(&tmp)?;
                for line in &remainder {
                    file.write_all(line.as_bytes())?;
                    file.write_all(b"\n")?;
                }
                file.sync_all()?;
            }
            fs::rename(&tmp, &self.path)?;
            self.dirty.store(true, Ordering::Release);
        }

        if skipped > 0 {
            warn!(count = skipped, "discarded malformed overflow records");
        }
        self.recovered
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        Ok(records)
    }

    /// The file may hold records worth a recovery pass.
    #[inline]
    pub fn needs_recovery(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    #[inline]
    pub fn persisted_count(&self) -> u64 {
        self.persisted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn recovered_count(&self) -> u64 {
        self.recovered.load(Ordering::Relaxed)
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".lock");
    PathBuf::from(os)
}
