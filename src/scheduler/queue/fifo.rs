/*!
 * Round-Robin Queue
 * FIFO ready queue; no descriptor field influences order
 */

use super::ReadyQueue;
use crate::process::{ProcHandle, Process, ProcessTable};
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct FifoQueue {
    entries: VecDeque<ProcHandle>,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members in dequeue order
    pub fn iter(&self) -> impl Iterator<Item = ProcHandle> + '_ {
        self.entries.iter().copied()
    }
}

impl ReadyQueue for FifoQueue {
    #[inline]
    fn enqueue(&mut self, handle: ProcHandle, _proc: &Process) {
        self.entries.push_back(handle);
    }

    #[inline]
    fn dequeue_next(&mut self) -> Option<ProcHandle> {
        self.entries.pop_front()
    }

    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, handle: ProcHandle) -> bool {
        self.entries.contains(&handle)
    }

    fn drain_into(&mut self, target: &mut dyn ReadyQueue, table: &ProcessTable) {
        for handle in self.entries.drain(..) {
            target.enqueue(handle, table.proc(handle));
        }
    }
}
