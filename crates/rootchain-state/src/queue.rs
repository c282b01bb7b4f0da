//! # Ordered Container
//!
//! The scheduler only needs "give me the smallest key". That capability is
//! the [`PriorityQueue`] trait; [`HeapQueue`] is the binary-heap reference
//! implementation.
//!
//! Ties are not the container's concern: [`ScheduleKey`] carries the
//! submission sequence, so no two live keys compare equal.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rootchain_core::PriorityKey;
use serde::{Deserialize, Serialize};

/// Min-ordered container keyed by `K`.
pub trait PriorityQueue<K: Ord, V> {
    /// Insert `value` under `key`.
    fn insert(&mut self, key: K, value: V);

    /// The entry with the smallest key, without removing it.
    fn peek_min(&self) -> Option<(&K, &V)>;

    /// Remove and return the entry with the smallest key.
    fn remove_min(&mut self) -> Option<(K, V)>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the container is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scheduling order: priority first, submission sequence second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleKey {
    /// Caller-assigned priority. Lower is served first.
    pub priority_key: PriorityKey,
    /// Submission sequence, breaks ties first-come first-served.
    pub sequence: u64,
}

/// Binary-heap [`PriorityQueue`]. `O(log n)` insert and remove.
#[derive(Debug)]
pub struct HeapQueue<K, V> {
    heap: BinaryHeap<Reverse<HeapItem<K, V>>>,
}

#[derive(Debug)]
struct HeapItem<K, V> {
    key: K,
    value: V,
}

// Ordering looks at the key only, so values need no Ord bound.
impl<K: Ord, V> PartialEq for HeapItem<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord, V> Eq for HeapItem<K, V> {}

impl<K: Ord, V> PartialOrd for HeapItem<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for HeapItem<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl<K, V> HeapQueue<K, V> {
    /// An empty queue.
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }
}

impl<K, V> Default for HeapQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> PriorityQueue<K, V> for HeapQueue<K, V> {
    fn insert(&mut self, key: K, value: V) {
        self.heap.push(Reverse(HeapItem { key, value }));
    }

    fn peek_min(&self) -> Option<(&K, &V)> {
        self.heap.peek().map(|Reverse(item)| (&item.key, &item.value))
    }

    fn remove_min(&mut self) -> Option<(K, V)> {
        self.heap.pop().map(|Reverse(item)| (item.key, item.value))
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}
