//! Fixed-capacity candidate pool.
//!
//! Keeps the best `capacity` designs seen so far, ranked by score with ties
//! broken by insertion order (earlier wins). The worst retained entry sits at
//! the top of a min-heap so it can be evicted in `O(log K)`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use ndarray::Array2;

use crate::design::Design;

/// A scored design in the pool.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The (partial) design.
    pub design: Design,
    /// Its D-efficiency.
    pub score: f64,
    seq: u64,
}

impl Candidate {
    /// Ranking key: higher score first, then earlier insertion.
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Heap entry ordered so the *worst* candidate is the maximum.
struct Worst(Candidate);

impl PartialEq for Worst {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Worst {}

impl PartialOrd for Worst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Worst {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.rank(&self.0)
    }
}

/// Bounded pool retaining the top-`capacity` candidates.
pub struct CandidatePool {
    capacity: usize,
    heap: BinaryHeap<Worst>,
    retained: HashSet<Array2<u32>>,
    next_seq: u64,
    offered: usize,
}

impl CandidatePool {
    /// Create an empty pool. A capacity of 0 is raised to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
            retained: HashSet::with_capacity(capacity + 1),
            next_seq: 0,
            offered: 0,
        }
    }

    /// Offer a scored design.
    ///
    /// Returns `true` if the design is retained. A design identical to one
    /// already retained is rejected.
    pub fn offer(&mut self, design: Design, score: f64) -> bool {
        self.offered += 1;
        if self.retained.contains(design.data()) {
            return false;
        }

        let candidate = Candidate {
            design,
            score,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        if self.heap.len() == self.capacity {
            match self.heap.peek() {
                Some(worst) if candidate.rank(&worst.0) == Ordering::Greater => {}
                _ => return false,
            }
            if let Some(Worst(evicted)) = self.heap.pop() {
                self.retained.remove(evicted.design.data());
            }
        }

        self.retained.insert(candidate.design.data().clone());
        self.heap.push(Worst(candidate));
        true
    }

    /// Number of retained candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no candidate is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of designs offered so far, retained or not.
    #[must_use]
    pub fn offered(&self) -> usize {
        self.offered
    }

    /// Consume the pool, returning candidates best first.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Candidate> {
        // Ascending in `Worst` order is best-first.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Worst(c)| c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignParams;

    fn single(values: &[u32]) -> Design {
        let params = DesignParams::new(values.len(), vec![4], 1).unwrap();
        Design::new(
            Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap(),
            params,
        )
    }

    #[test]
    fn test_keeps_top_k() {
        let mut pool = CandidatePool::new(2);
        assert!(pool.offer(single(&[0, 1]), 0.5));
        assert!(pool.offer(single(&[0, 2]), 0.9));
        assert!(pool.offer(single(&[0, 3]), 0.7));
        assert!(!pool.offer(single(&[1, 2]), 0.1));

        let kept: Vec<f64> = pool.into_sorted().iter().map(|c| c.score).collect();
        assert_eq!(kept, vec![0.9, 0.7]);
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let mut pool = CandidatePool::new(2);
        pool.offer(single(&[0, 1]), 0.5);
        pool.offer(single(&[0, 2]), 0.5);
        assert!(!pool.offer(single(&[0, 3]), 0.5));

        let kept: Vec<Vec<u32>> = pool
            .into_sorted()
            .iter()
            .map(|c| c.design.column(0).to_vec())
            .collect();
        assert_eq!(kept, vec![vec![0, 1], vec![0, 2]]);
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut pool = CandidatePool::new(4);
        assert!(pool.offer(single(&[0, 1]), 0.5));
        assert!(!pool.offer(single(&[0, 1]), 0.5));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.offered(), 2);
    }

    #[test]
    fn test_evicted_design_can_return() {
        let mut pool = CandidatePool::new(1);
        pool.offer(single(&[0, 1]), 0.2);
        pool.offer(single(&[0, 2]), 0.8);
        assert!(!pool.offer(single(&[0, 1]), 0.2));
        assert!(pool.offer(single(&[0, 3]), 0.9));

        let best = pool.into_sorted();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].design.column(0).to_vec(), vec![0, 3]);
    }
}
