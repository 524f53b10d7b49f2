/*!
 * Priority / Accumulator Queue
 * Min-ordered by accumulator; equal accumulators go to the lowest pid
 */

use super::ReadyQueue;
use crate::core::types::{Accumulator, Pid};
use crate::process::{ProcHandle, Process, ProcessTable};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry; the accumulator is frozen while the process is queued
#[derive(Debug, Clone, Copy)]
struct Entry {
    accumulator: Accumulator,
    pid: Pid,
    handle: ProcHandle,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: smaller accumulator, then smaller pid, ranks higher
        other
            .accumulator
            .cmp(&self.accumulator)
            .then_with(|| other.pid.cmp(&self.pid))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct AccumulatorQueue {
    heap: BinaryHeap<Entry>,
}

impl AccumulatorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest queued accumulator, `None` when empty
    #[inline]
    pub fn peek_min_accumulator(&self) -> Option<Accumulator> {
        self.heap.peek().map(|e| e.accumulator)
    }

    /// Remove a specific process - O(n) rebuild
    pub fn remove(&mut self, handle: ProcHandle) -> bool {
        let before = self.heap.len();
        self.heap.retain(|e| e.handle != handle);
        self.heap.len() < before
    }

    /// Queued handles in no particular order
    pub fn iter(&self) -> impl Iterator<Item = ProcHandle> + '_ {
        self.heap.iter().map(|e| e.handle)
    }
}

impl ReadyQueue for AccumulatorQueue {
    #[inline]
    fn enqueue(&mut self, handle: ProcHandle, proc: &Process) {
        self.heap.push(Entry {
            accumulator: proc.accumulator,
            pid: proc.pid,
            handle,
        });
    }

    /// extract-min
    #[inline]
    fn dequeue_next(&mut self) -> Option<ProcHandle> {
        self.heap.pop().map(|e| e.handle)
    }

    #[inline]
    fn len(&self) -> usize {
        self.heap.len()
    }

    fn contains(&self, handle: ProcHandle) -> bool {
        self.heap.iter().any(|e| e.handle == handle)
    }

    /// Smallest accumulator first
    fn drain_into(&mut self, target: &mut dyn ReadyQueue, table: &ProcessTable) {
        let entries = std::mem::take(&mut self.heap).into_sorted_vec();
        for entry in entries.into_iter().rev() {
            target.enqueue(entry.handle, table.proc(entry.handle));
        }
    }
}
