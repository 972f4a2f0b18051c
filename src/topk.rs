//! Bounded top-K by score: highest score first, ties in encounter order.
//!
//! Memory stays at K entries. The result equals a stable descending sort of the
//! whole input truncated to K.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Entry<T> {
    score: i64,
    seq: u64,
    item: T,
}

impl<T> Entry<T> {
    // Larger key = better rank: higher score, then earlier encounter.
    fn key(&self) -> (i64, Reverse<u64>) {
        (self.score, Reverse(self.seq))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl<T> Eq for Entry<T> {}
impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

pub struct TopK<T> {
    k: usize,
    seq: u64,
    // min-heap on rank: the root is the current worst kept entry
    heap: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> TopK<T> {
    pub fn new(k: usize) -> Self {
        Self { k, seq: 0, heap: BinaryHeap::with_capacity(k.min(1 << 16) + 1) }
    }

    pub fn push(&mut self, score: i64, item: T) {
        let entry = Entry { score, seq: self.seq, item };
        self.seq += 1;
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(Reverse(entry));
            return;
        }
        // A later entry only displaces the worst one on a strictly higher score.
        let beats_worst = self.heap.peek().is_some_and(|Reverse(worst)| entry > *worst);
        if beats_worst {
            self.heap.pop();
            self.heap.push(Reverse(entry));
        }
    }

    /// Number of items offered so far.
    pub fn seen(&self) -> u64 {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Kept items, best first.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let mut v: Vec<Entry<T>> = self.heap.into_iter().map(|Reverse(e)| e).collect();
        v.sort_by(|a, b| b.cmp(a));
        v.into_iter().map(|e| e.item).collect()
    }
}

/// Convenience over `TopK` for an in-memory list.
pub fn top_k<T>(items: impl IntoIterator<Item = T>, k: usize, score: impl Fn(&T) -> i64) -> Vec<T> {
    let mut top = TopK::new(k);
    for it in items {
        let s = score(&it);
        top.push(s, it);
    }
    top.into_sorted_vec()
}
