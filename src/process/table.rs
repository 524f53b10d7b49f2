/*!
 * Process Table
 *
 * Fixed-capacity arena of process descriptors. Slots are addressed through
 * generational handles: releasing a slot bumps its generation, so a handle
 * kept across teardown can never resolve to the slot's next occupant.
 */

use super::types::{Accounting, Process, ProcessState};
use crate::core::errors::{invariant_violation, ProcessError, ProcessResult};
use crate::core::limits::{DEFAULT_PRIORITY, FIRST_PID};
use crate::core::types::{Pid, Tick};
use log::debug;
use std::fmt;

/// Stable reference to a process table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcHandle {
    slot: usize,
    generation: u32,
}

impl ProcHandle {
    #[inline(always)]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    #[inline(always)]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    fn stale(&self) -> ProcessError {
        ProcessError::StaleHandle {
            slot: self.slot,
            generation: self.generation,
        }
    }
}

impl fmt::Display for ProcHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.slot, self.generation)
    }
}

struct Slot {
    generation: u32,
    proc: Process,
}

/// Process table
pub struct ProcessTable {
    slots: Vec<Slot>,
    next_pid: Pid,
}

impl ProcessTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| Slot {
                    generation: 0,
                    proc: Process::unused(),
                })
                .collect(),
            next_pid: FIRST_PID,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim the first Unused slot and move it to Embryo
    ///
    /// `now` is the clock tick stamped as creation time, `bedtime` the
    /// current dispatch tick.
    pub fn allocate(&mut self, name: &str, now: Tick, bedtime: Tick) -> ProcessResult<ProcHandle> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .iter()
            .position(|s| s.proc.is_unused())
            .ok_or(ProcessError::TableFull(capacity))?;

        let pid = self.next_pid;
        self.next_pid += 1;

        let entry = &mut self.slots[slot];
        entry.proc = Process {
            pid,
            name: name.to_string(),
            state: ProcessState::Embryo,
            priority: DEFAULT_PRIORITY,
            bedtime: Some(bedtime),
            times: Accounting::created_at(now),
            ..Process::unused()
        };

        debug!("Allocated slot {} for pid {} ({})", slot, pid, name);
        Ok(ProcHandle {
            slot,
            generation: entry.generation,
        })
    }

    /// Return a reaped zombie's slot to Unused
    ///
    /// The descriptor must already be detached from its parent.
    pub fn release(&mut self, handle: ProcHandle) {
        let proc = self.proc(handle);
        if !proc.is_zombie() || proc.parent.is_some() {
            invariant_violation(format_args!(
                "release of pid {} in state {:?} (parent attached: {})",
                proc.pid,
                proc.state,
                proc.parent.is_some()
            ));
        }

        let entry = &mut self.slots[handle.slot];
        debug!("Released slot {} (pid {})", handle.slot, entry.proc.pid);
        entry.proc = Process::unused();
        entry.generation = entry.generation.wrapping_add(1);
    }

    /// Resolve a handle, `None` if the slot has been reused since
    #[inline]
    pub fn get(&self, handle: ProcHandle) -> Option<&Process> {
        self.slots
            .get(handle.slot)
            .filter(|s| s.generation == handle.generation && !s.proc.is_unused())
            .map(|s| &s.proc)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: ProcHandle) -> Option<&mut Process> {
        self.slots
            .get_mut(handle.slot)
            .filter(|s| s.generation == handle.generation && !s.proc.is_unused())
            .map(|s| &mut s.proc)
    }

    /// Resolve a handle an external caller supplied
    pub fn checked(&self, handle: ProcHandle) -> ProcessResult<&Process> {
        self.get(handle).ok_or_else(|| handle.stale())
    }

    /// Resolve a handle the core itself holds; a stale one is fatal
    #[track_caller]
    pub fn proc(&self, handle: ProcHandle) -> &Process {
        match self.get(handle) {
            Some(p) => p,
            None => invariant_violation(format_args!("stale handle {}", handle)),
        }
    }

    #[track_caller]
    pub fn proc_mut(&mut self, handle: ProcHandle) -> &mut Process {
        match self.get_mut(handle) {
            Some(p) => p,
            None => invariant_violation(format_args!("stale handle {}", handle)),
        }
    }

    /// Find the live slot holding `pid`
    pub fn lookup(&self, pid: Pid) -> Option<ProcHandle> {
        self.iter()
            .find(|(_, p)| p.pid == pid)
            .map(|(handle, _)| handle)
    }

    /// Every occupied slot, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ProcHandle, &Process)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.proc.is_unused())
            .map(|(slot, s)| {
                (
                    ProcHandle {
                        slot,
                        generation: s.generation,
                    },
                    &s.proc,
                )
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ProcHandle, &mut Process)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, s)| !s.proc.is_unused())
            .map(|(slot, s)| {
                (
                    ProcHandle {
                        slot,
                        generation: s.generation,
                    },
                    &mut s.proc,
                )
            })
    }

    /// Number of occupied slots in `state`
    pub fn count(&self, state: ProcessState) -> usize {
        self.iter().filter(|(_, p)| p.state == state).count()
    }
}
