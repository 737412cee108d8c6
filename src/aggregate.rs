use crate::error::{FastqError, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Fan-in side of the scheduler: receives each chunk's output exactly once, tagged with the
/// chunk index, in whatever order the workers finish.
pub trait Aggregator<T> {
    type Output;

    fn accept(&mut self, index: usize, batch: T) -> Result<()>;

    fn finish(self) -> Result<Self::Output>;
}

struct Pending<T> {
    index: usize,
    batch: Vec<T>,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Pending<T> {
    // Reversed so the max-heap pops the smallest index first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.index.cmp(&self.index)
    }
}

/// Concatenates per-chunk batches in ascending chunk-index order.
///
/// Batches that arrive early wait in a min-heap until every lower index has been merged,
/// so the output never depends on worker completion order.
pub struct OrderedConcat<T> {
    next_index: usize,
    pending: BinaryHeap<Pending<T>>,
    merged: Vec<T>,
}

impl<T> Default for OrderedConcat<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedConcat<T> {
    pub fn new() -> Self {
        OrderedConcat {
            next_index: 0,
            pending: BinaryHeap::new(),
            merged: Vec::new(),
        }
    }

    /// Batches held back waiting for a lower index.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn flush_ready(&mut self) {
        while self
            .pending
            .peek()
            .is_some_and(|top| top.index == self.next_index)
        {
            if let Some(Pending { batch, .. }) = self.pending.pop() {
                self.merged.extend(batch);
                self.next_index += 1;
            }
        }
    }
}

impl<T> Aggregator<Vec<T>> for OrderedConcat<T> {
    type Output = Vec<T>;

    fn accept(&mut self, index: usize, batch: Vec<T>) -> Result<()> {
        if index < self.next_index || self.pending.iter().any(|p| p.index == index) {
            return Err(FastqError::InvalidRecord {
                msg: format!("chunk {} delivered twice", index),
            });
        }
        self.pending.push(Pending { index, batch });
        self.flush_ready();
        Ok(())
    }

    fn finish(self) -> Result<Vec<T>> {
        if let Some(top) = self.pending.peek() {
            return Err(FastqError::InvalidRecord {
                msg: format!(
                    "chunk {} missing while chunk {} is complete",
                    self.next_index, top.index
                ),
            });
        }
        Ok(self.merged)
    }
}

/// Running total of per-chunk counts. Addition commutes, so no reordering is needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Summation {
    total: usize,
}

impl Summation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregator<usize> for Summation {
    type Output = usize;

    fn accept(&mut self, _index: usize, batch: usize) -> Result<()> {
        self.total += batch;
        Ok(())
    }

    fn finish(self) -> Result<usize> {
        Ok(self.total)
    }
}
