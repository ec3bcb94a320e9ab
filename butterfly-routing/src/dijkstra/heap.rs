//! Min-priority queue on `f64` priorities

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
struct Entry<T> {
    priority: f64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
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
        // reversed: std's heap is a max-heap
        other.priority.total_cmp(&self.priority)
    }
}

/// Binary heap popping the lowest priority first.
///
/// Items with equal priorities come out in unspecified order.
#[derive(Debug, Clone)]
pub struct BinaryHeap<T> {
    heap: std::collections::BinaryHeap<Entry<T>>,
}

impl<T> Default for BinaryHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BinaryHeap<T> {
    pub fn new() -> Self {
        Self {
            heap: std::collections::BinaryHeap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: std::collections::BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T, priority: f64) {
        self.heap.push(Entry { priority, item });
    }

    pub fn pop(&mut self) -> Option<(T, f64)> {
        self.heap.pop().map(|entry| (entry.item, entry.priority))
    }

    /// Lowest priority in the heap.
    pub fn peek_priority(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.priority)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn pops_lowest_first() {
        let mut heap = BinaryHeap::new();
        heap.push("c", 3.0);
        heap.push("a", 1.0);
        heap.push("b", 2.0);
        assert_eq!(heap.peek_priority(), Some(1.0));
        assert_eq!(heap.pop(), Some(("a", 1.0)));
        assert_eq!(heap.pop(), Some(("b", 2.0)));
        assert_eq!(heap.pop(), Some(("c", 3.0)));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn random_pushes_pop_in_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut heap = BinaryHeap::with_capacity(16);
        let mut expected = 0usize;

        for round in 0..50 {
            for _ in 0..rng.random_range(1..40) {
                heap.push(round, rng.random_range(0.0..1000.0));
                expected += 1;
                assert_eq!(heap.len(), expected);
            }
            for _ in 0..rng.random_range(0..20) {
                if heap.pop().is_some() {
                    expected -= 1;
                }
                assert_eq!(heap.len(), expected);
            }
        }

        let mut last = f64::NEG_INFINITY;
        while let Some((_, priority)) = heap.pop() {
            assert!(priority >= last);
            last = priority;
            expected -= 1;
        }
        assert_eq!(expected, 0);
        assert!(heap.is_empty());
    }

    #[test]
    fn infinite_priorities_sort_last() {
        let mut heap = BinaryHeap::new();
        heap.push(1, f64::INFINITY);
        heap.push(2, 5.0);
        heap.clear();
        assert!(heap.is_empty());

        heap.push(1, f64::INFINITY);
        heap.push(2, 5.0);
        assert_eq!(heap.pop().map(|(item, _)| item), Some(2));
        assert_eq!(heap.pop().map(|(item, _)| item), Some(1));
    }
}
