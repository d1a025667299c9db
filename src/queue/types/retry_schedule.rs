//! Retry schedule: a list kept sorted ascending by due time.
//!
//! Because insertion is ordered, the entries due at any instant are always a
//! contiguous prefix - flushing removes exactly that prefix, never scanning
//! or skipping.

use std::collections::VecDeque;

use super::job::Job;

pub struct RetryEntry<T> {
    /// Epoch ms at which the job becomes eligible for re-dispatch.
    pub execute_at: u64,
    pub job: Job<T>,
}

pub struct RetrySchedule<T> {
    entries: VecDeque<RetryEntry<T>>,
}

impl<T> RetrySchedule<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Ordered insert by `execute_at`; equal due times keep insertion order.
    pub fn insert(&mut self, entry: RetryEntry<T>) {
        let idx = self
            .entries
            .partition_point(|e| e.execute_at <= entry.execute_at);
        self.entries.insert(idx, entry);
    }

    /// Due time of the earliest entry, if any.
    #[inline]
    pub fn next_due(&self) -> Option<u64> {
        self.entries.front().map(|e| e.execute_at)
    }

    /// Remove and return every entry with `execute_at <= now` in one batch.
    ///
    /// The list is sorted ascending, so due entries are a prefix; entries not
    /// yet due are never removed early.
    pub fn take_due(&mut self, now: u64) -> Vec<RetryEntry<T>> {
        let due = self.entries.partition_point(|e| e.execute_at <= now);
        self.entries.drain(..due).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for RetrySchedule<T> {
    fn default() -> Self {
        Self::new()
    }
}
