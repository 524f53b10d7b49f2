/*!
 * Discipline Switching
 * Live migration between ready-queue representations and priority updates
 */

use super::SchedCore;
use crate::core::errors::invariant_violation;
use crate::core::types::Priority;
use crate::process::ProcHandle;
use crate::scheduler::policy::Discipline;
use crate::scheduler::queue::ReadyQueue;
use log::{debug, info};

impl SchedCore {
    /// Switch the active discipline, migrating every Runnable process
    ///
    /// Returns `false` (and changes nothing) when `target` is already active.
    pub fn set_discipline(&mut self, target: Discipline) -> bool {
        let from = self.ctx.discipline;
        if from == target {
            return false;
        }

        let queued = self.ready_len();
        match (from, target) {
            (Discipline::RoundRobin, Discipline::Priority)
            | (Discipline::RoundRobin, Discipline::ExtendedPriority) => {
                self.fifo.drain_into(&mut self.heap, &self.table);
                self.clamp_priorities(Discipline::Priority.min_priority());
            }
            (Discipline::Priority, Discipline::RoundRobin)
            | (Discipline::ExtendedPriority, Discipline::RoundRobin) => {
                self.heap.drain_into(&mut self.fifo, &self.table);
                self.reset_accumulators();
            }
            (Discipline::ExtendedPriority, Discipline::Priority) => {
                self.clamp_priorities(Discipline::Priority.min_priority());
            }
            // Priority -> ExtendedPriority shares the heap and the clamp
            _ => {}
        }

        self.ctx.discipline = target;
        // Entering ExtendedPriority relaxes the floor to 0 from either side,
        // even though a RoundRobin source was just clamped
        self.ctx.min_priority = target.min_priority();

        let migrated = self.ready_len();
        if migrated != queued || !self.inactive_queue().is_empty() {
            invariant_violation(format_args!(
                "discipline switch {} -> {} moved {} of {} runnable processes",
                from, target, migrated, queued
            ));
        }

        self.stats.set_discipline(target);
        self.stats.set_runnable(migrated);
        info!(
            "Scheduling discipline changed: {} -> {} ({} runnable migrated)",
            from, target, migrated
        );
        true
    }

    /// Numeric form of [`set_discipline`](Self::set_discipline)
    ///
    /// Out-of-range identifiers are ignored and return `false`.
    pub fn set_discipline_id(&mut self, id: i32) -> bool {
        match Discipline::from_id(id) {
            Some(target) => self.set_discipline(target),
            None => {
                debug!("Ignoring unknown discipline id {}", id);
                false
            }
        }
    }

    /// Set the caller's own priority
    ///
    /// Values outside the current bounds are silently ignored. The accumulator
    /// is untouched; a queued caller keeps its heap position until re-enqueued.
    pub fn set_priority(&mut self, caller: ProcHandle, value: i32) -> bool {
        if !self.ctx.admits(value) {
            debug!("Ignoring out-of-range priority {} for {}", value, caller);
            return false;
        }
        match (self.table.get_mut(caller), Priority::try_from(value)) {
            (Some(p), Ok(priority)) => {
                p.priority = priority;
                true
            }
            _ => false,
        }
    }

    fn clamp_priorities(&mut self, min: Priority) {
        for (_, p) in self.table.iter_mut() {
            if p.priority < min {
                p.priority = min;
            }
        }
    }

    fn reset_accumulators(&mut self) {
        for (_, p) in self.table.iter_mut() {
            p.accumulator = 0;
        }
    }
}
