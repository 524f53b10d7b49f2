/*!
 * Ready Queues
 * The two representations behind the active discipline
 */

mod accumulator;
mod fifo;

pub use accumulator::AccumulatorQueue;
pub use fifo::FifoQueue;

use crate::process::{ProcHandle, Process, ProcessTable};

/// Capability set shared by both ready-queue representations
pub trait ReadyQueue {
    /// Add a Runnable process; `proc` is its descriptor at insertion time
    fn enqueue(&mut self, handle: ProcHandle, proc: &Process);

    /// Remove the next process in this queue's order
    fn dequeue_next(&mut self) -> Option<ProcHandle>;

    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `handle` is queued
    fn contains(&self, handle: ProcHandle) -> bool;

    /// Move every member into `target` in this queue's dequeue order,
    /// leaving `self` empty
    fn drain_into(&mut self, target: &mut dyn ReadyQueue, table: &ProcessTable);
}
