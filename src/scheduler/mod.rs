/*!
 * Scheduler Module
 *
 * The single scheduler lock, the per-CPU dispatch loop and runtime
 * discipline switching.
 */

pub mod config;
pub mod core;
pub mod cpu;
pub mod policy;
pub mod queue;
pub mod running;
pub mod stats;

// Re-export public API
pub use self::core::SchedCore;
pub use config::SchedulerConfig;
pub use cpu::{ContextSwitch, Cpu, CpuLock, IrqGuard};
pub use policy::{Discipline, SchedContext};
pub use queue::{AccumulatorQueue, FifoQueue, ReadyQueue};
pub use running::RunningSet;
pub use stats::{AtomicSchedulerStats, SchedulerStats};

use crate::core::errors::ProcessResult;
use crate::core::types::{Pid, Tick};
use crate::monitoring::{span_cpu, span_operation};
use crate::process::{ProcHandle, ProcessInfo};
use log::{debug, info};
use parking_lot::{Mutex, MutexGuard};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Process scheduler shared by every CPU
///
/// # Performance
/// - One `parking_lot::Mutex` serializes every scheduling decision
/// - Statistics live outside the lock and are readable at any time
pub struct Scheduler {
    core: Mutex<SchedCore>,
    stats: Arc<AtomicSchedulerStats>,
    halted: AtomicBool,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let stats = Arc::new(AtomicSchedulerStats::new(config.discipline));
        info!(
            "Scheduler initialized: discipline={}, cpus={}, nproc={}",
            config.discipline, config.cpus, config.nproc
        );
        Self {
            core: Mutex::new(SchedCore::new(&config, Arc::clone(&stats))),
            stats,
            halted: AtomicBool::new(false),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Take the scheduler lock from outside any CPU (setup, inspection)
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, SchedCore> {
        self.core.lock()
    }

    /// Take the scheduler lock on behalf of `cpu`, interrupts off until release
    pub fn lock_on<'a>(&'a self, cpu: &'a Cpu) -> CpuLock<'a> {
        let irq = cpu.push_off();
        CpuLock::new(self.core.lock(), irq)
    }

    /// One iteration of the dispatch loop on `cpu`
    ///
    /// Returns the pid that ran, or `None` when nothing was Runnable.
    pub fn step<C>(&self, cpu: &Cpu, switch: &C) -> Option<Pid>
    where
        C: ContextSwitch + ?Sized,
    {
        cpu.enable_interrupts();

        let mut lock = self.lock_on(cpu);
        let handle = lock.dispatch_next()?;
        lock.begin_run(cpu.id(), handle);
        let pid = lock.table().proc(handle).pid;
        self.stats.inc_context_switches();

        switch.switch_to(cpu, lock.guard(), handle);

        lock.end_run(cpu.id(), handle);
        Some(pid)
    }

    /// Dispatch loop for `cpu`, returning once the scheduler is halted
    pub fn run_cpu<C>(&self, cpu: &Cpu, switch: &C)
    where
        C: ContextSwitch + ?Sized,
    {
        info!("cpu{} entering dispatch loop", cpu.id());
        while !self.is_halted() {
            if self.step(cpu, switch).is_none() {
                thread::yield_now();
            }
        }
        debug!("cpu{} halted", cpu.id());
    }

    /// Start one named thread per configured CPU
    pub fn boot<C>(self: &Arc<Self>, switch: Arc<C>) -> io::Result<Vec<JoinHandle<()>>>
    where
        C: ContextSwitch + 'static,
    {
        (0..self.config.cpus)
            .map(|id| {
                let scheduler = Arc::clone(self);
                let switch = Arc::clone(&switch);
                thread::Builder::new()
                    .name(format!("cpu{}", id))
                    .spawn(move || {
                        let _span = span_cpu(id).entered();
                        let cpu = Cpu::new(id);
                        scheduler.run_cpu(&cpu, switch.as_ref());
                    })
            })
            .collect()
    }

    /// Ask every dispatch loop to stop at its next iteration
    pub fn halt(&self) {
        info!("Scheduler halt requested");
        self.halted.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Lock-free statistics snapshot
    #[inline]
    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    #[inline]
    pub fn discipline(&self) -> Discipline {
        self.lock().discipline()
    }

    pub fn spawn_init(&self, name: &str) -> ProcessResult<ProcHandle> {
        self.lock().spawn_init(name)
    }

    pub fn set_discipline(&self, discipline: Discipline) -> bool {
        let op = span_operation("set_discipline");
        let _entered = op.enter();
        let mut core = self.lock();
        let changed = core.set_discipline(discipline);
        op.record_items_processed(core.ready_len());
        changed
    }

    pub fn set_discipline_id(&self, id: i32) -> bool {
        self.lock().set_discipline_id(id)
    }

    pub fn kill(&self, pid: Pid) -> ProcessResult<()> {
        self.lock().kill(pid)
    }

    /// Timer interrupt
    pub fn clock_tick(&self) -> Tick {
        self.lock().clock_tick()
    }

    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        self.lock().snapshot()
    }

    pub fn info(&self, pid: Pid) -> Option<ProcessInfo> {
        self.lock().info(pid)
    }
}
