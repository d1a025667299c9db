//! Priority-ordered main queue.
//!
//! A max-heap over (priority, id): higher priority pops first, and the
//! monotonic job id breaks ties so equal-priority jobs pop in insertion
//! order. Pushing is an ordered insert (O(log n)), never an append+sort.

use std::collections::BinaryHeap;

use super::job::Job;

struct ReadyEntry<T>(Job<T>);

impl<T> Eq for ReadyEntry<T> {}

impl<T> PartialEq for ReadyEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl<T> Ord for ReadyEntry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher priority = greater (popped first from max-heap)
        // FIFO among equal priority: lower id = greater (older jobs first)
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.id.cmp(&self.0.id))
    }
}

impl<T> PartialOrd for ReadyEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub struct ReadyQueue<T> {
    heap: BinaryHeap<ReadyEntry<T>>,
}

impl<T> ReadyQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Ordered insert - O(log n).
    #[inline]
    pub fn push(&mut self, job: Job<T>) {
        self.heap.push(ReadyEntry(job));
    }

    /// Pop the highest-priority job - O(log n).
    #[inline]
    pub fn pop(&mut self) -> Option<Job<T>> {
        self.heap.pop().map(|e| e.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<T> Default for ReadyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
