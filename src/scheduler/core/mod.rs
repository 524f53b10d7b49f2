/*!
 * Scheduling Core
 *
 * Everything the single scheduler lock protects: the process table, both
 * ready-queue representations, the running set and the policy context.
 *
 * # Invariant
 *
 * A live descriptor is in exactly one place at any instant:
 * - no queue (Embryo, Sleeping, Zombie)
 * - the active ready queue (Runnable)
 * - the running set (Running)
 */

use super::policy::{Discipline, SchedContext};
use super::queue::{AccumulatorQueue, FifoQueue, ReadyQueue};
use super::running::RunningSet;
use super::stats::AtomicSchedulerStats;
use super::SchedulerConfig;
use crate::core::errors::invariant_violation;
use crate::core::types::{CpuId, Pid, Priority, Tick};
use crate::process::{ProcHandle, ProcessInfo, ProcessState, ProcessTable};
use std::sync::Arc;

mod dispatch;
mod lifecycle;
mod switch;

/// Scheduler state guarded by the global lock
pub struct SchedCore {
    table: ProcessTable,
    ctx: SchedContext,
    fifo: FifoQueue,
    heap: AccumulatorQueue,
    running: RunningSet,
    /// Process dispatched on each CPU
    cpus: Vec<Option<ProcHandle>>,
    init: Option<ProcHandle>,
    stats: Arc<AtomicSchedulerStats>,
}

impl SchedCore {
    pub fn new(config: &SchedulerConfig, stats: Arc<AtomicSchedulerStats>) -> Self {
        Self {
            table: ProcessTable::new(config.nproc),
            ctx: SchedContext::new(config.discipline),
            fifo: FifoQueue::new(),
            heap: AccumulatorQueue::new(),
            running: RunningSet::new(config.cpus),
            cpus: vec![None; config.cpus],
            init: None,
            stats,
        }
    }

    #[inline]
    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    #[inline]
    pub fn context(&self) -> &SchedContext {
        &self.ctx
    }

    #[inline]
    pub fn discipline(&self) -> Discipline {
        self.ctx.discipline
    }

    /// Current `[min_priority, max_priority]`
    #[inline]
    pub fn priority_bounds(&self) -> (Priority, Priority) {
        (self.ctx.min_priority, self.ctx.max_priority)
    }

    #[inline]
    pub fn running(&self) -> &RunningSet {
        &self.running
    }

    #[inline]
    pub fn stats(&self) -> &AtomicSchedulerStats {
        &self.stats
    }

    /// Accounting clock (timer ticks since boot)
    #[inline]
    pub fn uptime(&self) -> Tick {
        self.ctx.clock
    }

    #[inline]
    pub fn init(&self) -> Option<ProcHandle> {
        self.init
    }

    /// Process dispatched on `cpu`
    #[inline]
    pub fn current(&self, cpu: CpuId) -> Option<ProcHandle> {
        self.cpus.get(cpu).copied().flatten()
    }

    #[inline]
    pub fn lookup(&self, pid: Pid) -> Option<ProcHandle> {
        self.table.lookup(pid)
    }

    /// Length of the active ready queue
    pub fn ready_len(&self) -> usize {
        self.active_queue().len()
    }

    /// Whether the active ready queue is empty
    #[inline]
    pub fn is_ready_empty(&self) -> bool {
        self.active_queue().is_empty()
    }

    /// Handles in the active ready queue (order unspecified for the heap)
    pub fn ready_handles(&self) -> Vec<ProcHandle> {
        match self.ctx.discipline {
            Discipline::RoundRobin => self.fifo.iter().collect(),
            Discipline::Priority | Discipline::ExtendedPriority => self.heap.iter().collect(),
        }
    }

    pub fn info(&self, pid: Pid) -> Option<ProcessInfo> {
        self.lookup(pid).map(|h| self.info_of(h))
    }

    /// Listing of every occupied slot
    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        self.table.iter().map(|(h, _)| self.info_of(h)).collect()
    }

    fn info_of(&self, handle: ProcHandle) -> ProcessInfo {
        let p = self.table.proc(handle);
        ProcessInfo {
            pid: p.pid,
            name: p.name.clone(),
            state: p.state,
            parent: p.parent.and_then(|h| self.table.get(h)).map(|pp| pp.pid),
            priority: p.priority,
            accumulator: p.accumulator,
            bedtime: p.bedtime,
            killed: p.killed,
            perf: p.times.perf(),
        }
    }

    fn active_queue(&self) -> &dyn ReadyQueue {
        match self.ctx.discipline {
            Discipline::RoundRobin => &self.fifo,
            Discipline::Priority | Discipline::ExtendedPriority => &self.heap,
        }
    }

    fn inactive_queue(&self) -> &dyn ReadyQueue {
        match self.ctx.discipline {
            Discipline::RoundRobin => &self.heap,
            Discipline::Priority | Discipline::ExtendedPriority => &self.fifo,
        }
    }

    /// Check the placement invariant across the whole table
    ///
    /// Halts on the first violation. Intended for tests and debug listings.
    pub fn verify(&self) {
        let active = self.active_queue();
        if !self.inactive_queue().is_empty() {
            invariant_violation("inactive ready queue is not empty");
        }

        let mut runnable = 0;
        for (h, p) in self.table.iter() {
            let queued = active.contains(h);
            let running = self.running.contains(h);
            match p.state {
                ProcessState::Runnable => {
                    runnable += 1;
                    if !queued || running {
                        invariant_violation(format_args!("runnable pid {} misplaced", p.pid));
                    }
                }
                ProcessState::Running => {
                    if queued || !running {
                        invariant_violation(format_args!("running pid {} misplaced", p.pid));
                    }
                }
                _ => {
                    if queued || running {
                        invariant_violation(format_args!(
                            "pid {} in state {:?} is queued or running",
                            p.pid, p.state
                        ));
                    }
                }
            }
        }

        if runnable != active.len() {
            invariant_violation(format_args!(
                "{} runnable processes but {} queued",
                runnable,
                active.len()
            ));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Core with `cpus` CPUs and a 16-slot table under `discipline`
    pub fn core(discipline: Discipline, cpus: usize) -> SchedCore {
        let config = SchedulerConfig::default()
            .with_nproc(16)
            .with_cpus(cpus)
            .with_discipline(discipline);
        SchedCore::new(&config, Arc::new(AtomicSchedulerStats::new(discipline)))
    }

    /// Core with an init process already dispatched and parked asleep
    pub fn booted(discipline: Discipline, cpus: usize) -> (SchedCore, ProcHandle) {
        let mut core = core(discipline, cpus);
        let init = core.spawn_init("init").unwrap();
        run(&mut core, 0, init, |c, h| c.sleep(h, crate::process::Channel::Event(0)));
        (core, init)
    }

    /// Dispatch `handle` on `cpu` (it must be the next pick) and run `body`
    pub fn run(
        core: &mut SchedCore,
        cpu: CpuId,
        expected: ProcHandle,
        body: impl FnOnce(&mut SchedCore, ProcHandle),
    ) {
        let picked = core.dispatch_next().expect("queue empty");
        assert_eq!(picked, expected);
        core.begin_run(cpu, picked);
        body(core, picked);
        core.end_run(cpu, picked);
    }

    /// Dispatch whatever is next and yield it straight back
    pub fn cycle(core: &mut SchedCore) -> ProcHandle {
        let h = core.dispatch_next().expect("queue empty");
        core.begin_run(0, h);
        core.yield_now(h);
        core.end_run(0, h);
        h
    }
}
