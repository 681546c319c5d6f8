//! Array-backed binary heap used to pick the lightest nodes while building the Huffman tree.
//!
//! The ordering policy is fixed when the queue is created. Items that are never popped are
//! dropped with the queue; popped items belong to the caller.

use std::fmt;

/// Slots reserved by a new queue. Grows by doubling.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Which end of the ordering `pop` returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapOrder {
    /// Smallest item first.
    Min,
    /// Largest item first.
    Max,
}

pub struct PriorityQueue<T> {
    data: Vec<T>,
    order: HeapOrder,
}

impl<T: Ord> PriorityQueue<T> {
    pub fn new(order: HeapOrder) -> Self {
        Self::with_capacity(order, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(order: HeapOrder, capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.max(1)),
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn order(&self) -> HeapOrder {
        self.order
    }

    /// The item `pop` would return next.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Visit every queued item in storage order (not priority order).
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn push(&mut self, item: T) {
        if self.data.len() == self.data.capacity() {
            let grow = self.data.capacity();
            self.data.reserve_exact(grow);
        }
        self.data.push(item);
        self.sift_up(self.data.len() - 1);
    }

    /// Remove and return the highest priority item, or None when the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.data.len().checked_sub(1)?;
        self.data.swap(0, last);
        let top = self.data.pop();
        self.sift_down(0);
        top
    }

    /// True if `a` must come out of the queue before `b`.
    #[inline(always)]
    fn outranks(&self, a: &T, b: &T) -> bool {
        match self.order {
            HeapOrder::Min => a < b,
            HeapOrder::Max => a > b,
        }
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.outranks(&self.data[index], &self.data[parent]) {
                break;
            }
            self.data.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let size = self.data.len();
        loop {
            let left = index * 2 + 1;
            let right = left + 1;
            let mut best = index;
            if left < size && self.outranks(&self.data[left], &self.data[best]) {
                best = left;
            }
            if right < size && self.outranks(&self.data[right], &self.data[best]) {
                best = right;
            }
            if best == index {
                break;
            }
            self.data.swap(index, best);
            index = best;
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("order", &self.order)
            .field("items", &self.data)
            .finish()
    }
}
