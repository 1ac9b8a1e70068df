// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wake queue primitives.
//!
//! The timer queue is a binary min-heap on wake time. It never supports removal:
//! every push is stamped with an ever-increasing order number that the parked
//! unit remembers, and entries whose stamp no longer matches are discarded when
//! they surface. Ties on wake time resolve in push order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TimerEntry<K> {
    pub wake_time: f64,
    pub order: u64,
    pub key: K,
}

impl<K> PartialEq for TimerEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K> Eq for TimerEntry<K> {}

impl<K> PartialOrd for TimerEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for TimerEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wake_time
            .total_cmp(&other.wake_time)
            .then(self.order.cmp(&other.order))
    }
}

/// Units parked on an absolute wake time, earliest first.
#[derive(Debug)]
pub(crate) struct TimerQueue<K> {
    heap: BinaryHeap<Reverse<TimerEntry<K>>>,
    next_order: u64,
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_order: 0,
        }
    }

    /// Pushes an entry and returns the stamp identifying it.
    pub fn push(&mut self, key: K, wake_time: f64) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        self.heap.push(Reverse(TimerEntry {
            wake_time,
            order,
            key,
        }));
        order
    }

    pub fn peek(&self) -> Option<TimerEntry<K>> {
        self.heap.peek().map(|Reverse(entry)| *entry)
    }

    pub fn pop(&mut self) -> Option<TimerEntry<K>> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
