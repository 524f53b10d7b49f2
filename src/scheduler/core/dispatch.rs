/*!
 * Dispatch Operations
 * Enqueue with accounting, next-process selection, aging, run bracketing
 */

use super::SchedCore;
use crate::core::errors::invariant_violation;
use crate::core::limits::AGING_INTERVAL;
use crate::core::types::{Accumulator, CpuId, Tick};
use crate::process::{ProcHandle, ProcessState};
use crate::scheduler::policy::Discipline;
use crate::scheduler::queue::ReadyQueue;
use log::{debug, trace};

impl SchedCore {
    /// Hand a Runnable process to the active discipline
    ///
    /// `is_new` marks a process arriving from Embryo or Sleeping: under an
    /// accumulator discipline it is pinned to the accumulator floor. A
    /// process coming back from Running instead pays its own priority into
    /// its accumulator.
    pub fn mark_runnable(&mut self, handle: ProcHandle, is_new: bool) {
        let discipline = self.ctx.discipline;
        let now = self.ctx.clock;
        let floor = (is_new && discipline.uses_accumulator()).then(|| self.accumulator_floor());

        let p = self.table.proc_mut(handle);
        if p.state != ProcessState::Runnable {
            invariant_violation(format_args!(
                "enqueue of pid {} in state {:?}",
                p.pid, p.state
            ));
        }

        p.times.ready_since = now;
        if is_new {
            if let Some(floor) = floor {
                p.accumulator = floor;
            }
        } else {
            p.times.rutime += now.saturating_sub(p.times.run_since);
            if discipline.uses_accumulator() {
                p.accumulator += Accumulator::from(p.priority);
            }
        }
        trace!(
            "pid {} ready (new: {}, accumulator: {})",
            p.pid,
            is_new,
            p.accumulator
        );

        let p = self.table.proc(handle);
        match discipline {
            Discipline::RoundRobin => self.fifo.enqueue(handle, p),
            Discipline::Priority | Discipline::ExtendedPriority => self.heap.enqueue(handle, p),
        }
        self.stats.set_runnable(self.ready_len());
    }

    /// Fairest accumulator for a process (re-)entering competition
    ///
    /// Minimum over the ready queue and the running set, zero when both are empty.
    pub fn accumulator_floor(&self) -> Accumulator {
        let queued = self.heap.peek_min_accumulator();
        let running = self.running.minimum_accumulator(&self.table);
        match (queued, running) {
            (Some(q), Some(r)) => q.min(r),
            (Some(q), None) => q,
            (None, Some(r)) => r,
            (None, None) => 0,
        }
    }

    /// Remove and return the next process per the active discipline
    ///
    /// Advances the dispatch tick once per decision, under every discipline.
    pub fn dispatch_next(&mut self) -> Option<ProcHandle> {
        if self.is_ready_empty() {
            return None;
        }

        let tick = self.ctx.dispatch_tick;
        let chosen = match self.ctx.discipline {
            Discipline::RoundRobin => self
                .fifo
                .dequeue_next()
                .unwrap_or_else(|| invariant_violation("round-robin queue empty after check")),
            Discipline::Priority => self
                .heap
                .dequeue_next()
                .unwrap_or_else(|| invariant_violation("priority queue empty after check")),
            Discipline::ExtendedPriority => self.extract_with_aging(tick),
        };

        self.ctx.dispatch_tick += 1;
        self.stats.inc_dispatched();
        self.stats.set_runnable(self.ready_len());
        Some(chosen)
    }

    /// Extract-min, overridden every `AGING_INTERVAL` ticks by the
    /// longest-waiting Runnable process
    fn extract_with_aging(&mut self, tick: Tick) -> ProcHandle {
        let min = self
            .heap
            .dequeue_next()
            .unwrap_or_else(|| invariant_violation("extended priority queue empty after check"));

        if tick % AGING_INTERVAL != 0 || self.heap.is_empty() {
            return min;
        }

        let aged = self
            .table
            .iter()
            .filter(|(_, p)| p.is_runnable())
            .filter_map(|(h, p)| p.bedtime.map(|bedtime| (bedtime, h.slot(), h)))
            .min()
            .map(|(_, _, h)| h)
            .unwrap_or_else(|| invariant_violation("aging pass found no runnable process"));

        if aged != min {
            self.heap.enqueue(min, self.table.proc(min));
            if !self.heap.remove(aged) {
                invariant_violation(format_args!(
                    "runnable pid {} missing from ready queue",
                    self.table.proc(aged).pid
                ));
            }
            self.stats.inc_aging_overrides();
            debug!(
                "Aging at tick {}: pid {} overrides pid {}",
                tick,
                self.table.proc(aged).pid,
                self.table.proc(min).pid
            );
        }

        aged
    }

    /// Mark a dequeued process Running on `cpu`, just before the context switch
    pub fn begin_run(&mut self, cpu: CpuId, handle: ProcHandle) {
        if let Some(other) = self.current(cpu) {
            invariant_violation(format_args!("cpu{} already running {}", cpu, other));
        }

        let now = self.ctx.clock;
        let p = self.table.proc_mut(handle);
        if p.state != ProcessState::Runnable {
            invariant_violation(format_args!(
                "dispatch of pid {} in state {:?}",
                p.pid, p.state
            ));
        }
        p.times.retime += now.saturating_sub(p.times.ready_since);
        p.times.run_since = now;
        p.state = ProcessState::Running;

        self.running.insert(handle);
        self.cpus[cpu] = Some(handle);
    }

    /// Bookkeeping once the context switch has returned to the scheduler
    pub fn end_run(&mut self, cpu: CpuId, handle: ProcHandle) {
        if self.current(cpu) != Some(handle) {
            invariant_violation(format_args!("cpu{} is not running {}", cpu, handle));
        }
        self.running.remove(handle);
        self.cpus[cpu] = None;

        let tick = self.ctx.dispatch_tick;
        let p = self.table.proc_mut(handle);
        match p.state {
            ProcessState::Running => invariant_violation(format_args!(
                "pid {} returned to scheduler still running",
                p.pid
            )),
            ProcessState::Zombie => {}
            _ => p.bedtime = Some(tick),
        }
    }
}
