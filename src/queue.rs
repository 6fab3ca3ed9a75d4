/*!
Binary min-heap of items keyed by `f32` priorities. The nearest neighbour
search feeds it with squared distances, and only ever needs to push, peek and
pop, so unlike a general purpose priority queue there is no way to update the
priority of an item already in the heap.
*/

use std::{cmp::Ordering, ops::Range};

/// Priority queue where the item with the lowest priority is popped first.
pub struct Pqueue<T> {
    items: Vec<(T, f32)>,
}

/// Get the index of the parent in the binary heap.
const fn heap_parent(index: usize) -> Option<usize> {
    if index > 0 {
        Some((index - 1) >> 1)
    } else {
        None
    }
}

/// Get the indices of the children in the binary heap.
const fn heap_children(index: usize) -> Range<usize> {
    let off = index << 1;
    (off + 1)..(off + 3)
}

impl<T> Pqueue<T> {
    pub fn new() -> Self {
        Pqueue { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Pqueue {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of items currently in the queue.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn compare(&self, i: usize, j: usize) -> Option<Ordering> {
        self.items[i].1.partial_cmp(&self.items[j].1)
    }

    fn sift_up(&mut self, index: usize) {
        let mut index = index;
        while let Some(pi) = heap_parent(index) {
            if let Some(Ordering::Less) = self.compare(index, pi) {
                self.items.swap(index, pi);
                index = pi;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, index: usize) {
        let mut index = index;
        while index < self.len() {
            match heap_children(index).fold(None, |prev: Option<usize>, ci| {
                if ci < self.len() {
                    match prev {
                        Some(prev) => match self.compare(ci, prev) {
                            Some(Ordering::Less) => Some(ci),
                            _ => Some(prev),
                        },
                        None => Some(ci),
                    }
                } else {
                    prev
                }
            }) {
                Some(child) => match self.compare(index, child) {
                    Some(Ordering::Less) | Some(Ordering::Equal) => break,
                    _ => {
                        self.items.swap(index, child);
                        index = child;
                    }
                },
                None => break,
            }
        }
    }

    /// Insert an item with the given priority.
    pub fn push(&mut self, item: T, priority: f32) {
        self.items.push((item, priority));
        self.sift_up(self.len() - 1);
    }

    /// The item with the lowest priority, without removing it.
    pub fn top(&self) -> Option<&T> {
        self.items.first().map(|(item, _)| item)
    }

    /// The lowest priority in the queue.
    pub fn min_priority(&self) -> Option<f32> {
        self.items.first().map(|(_, priority)| *priority)
    }

    /// Remove the item with the lowest priority and return it.
    pub fn pop(&mut self) -> Option<(T, f32)> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        self.items.swap(0, last);
        let out = self.items.pop();
        self.sift_down(0);
        out
    }
}

impl<T> Default for Pqueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
