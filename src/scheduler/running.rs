/*!
 * Running Set
 * Processes currently dispatched, at most one per CPU
 */

use crate::core::errors::invariant_violation;
use crate::core::types::Accumulator;
use crate::process::{ProcHandle, ProcessTable};

#[derive(Debug)]
pub struct RunningSet {
    members: Vec<ProcHandle>,
    capacity: usize,
}

impl RunningSet {
    pub fn new(cpus: usize) -> Self {
        Self {
            members: Vec::with_capacity(cpus),
            capacity: cpus,
        }
    }

    pub fn insert(&mut self, handle: ProcHandle) {
        if self.members.contains(&handle) {
            invariant_violation(format_args!("{} dispatched twice", handle));
        }
        if self.members.len() == self.capacity {
            invariant_violation(format_args!(
                "running set full ({} CPUs) while inserting {}",
                self.capacity, handle
            ));
        }
        self.members.push(handle);
    }

    pub fn remove(&mut self, handle: ProcHandle) {
        match self.members.iter().position(|&h| h == handle) {
            Some(pos) => {
                self.members.swap_remove(pos);
            }
            None => invariant_violation(format_args!("{} not in running set", handle)),
        }
    }

    #[inline]
    pub fn contains(&self, handle: ProcHandle) -> bool {
        self.members.contains(&handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Smallest accumulator among running processes, `None` when idle
    pub fn minimum_accumulator(&self, table: &ProcessTable) -> Option<Accumulator> {
        self.members
            .iter()
            .map(|&h| table.proc(h).accumulator)
            .min()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProcHandle> + '_ {
        self.members.iter().copied()
    }
}
