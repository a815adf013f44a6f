use crate::harbor::Weighted;
use std::collections::vec_deque::{self, VecDeque};

#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "cannot dequeue from an empty line")]
pub struct EmptyQueue;

/// FIFO whose "length" is the total weight of its members rather than the
/// number of items. Not synchronized; the owner keeps it behind a lock.
#[derive(Debug)]
pub struct CapacityQueue<T: Weighted> {
    items: VecDeque<T>,
    weight: u32,
}

impl<T: Weighted> CapacityQueue<T> {
    pub fn new() -> CapacityQueue<T> {
        CapacityQueue {
            items: VecDeque::new(),
            weight: 0,
        }
    }

    pub fn enqueue(&mut self, item: T) {
        self.weight += item.weight();
        self.items.push_back(item);
    }

    pub fn dequeue(&mut self) -> Result<T, EmptyQueue> {
        let item = self.items.pop_front().ok_or(EmptyQueue)?;

        self.weight -= item.weight();

        Ok(item)
    }

    pub fn head(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether `weight` more units would still be within `capacity`.
    pub fn fits(&self, weight: u32, capacity: u32) -> bool {
        self.weight + weight <= capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Weighted> Default for CapacityQueue<T> {
    fn default() -> Self {
        CapacityQueue::new()
    }
}
