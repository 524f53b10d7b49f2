/*!
 * Program Executor
 *
 * Host-side context switch: every pid is backed by a [`Program`] that the
 * executor resumes whenever the scheduler dispatches it. A program runs with
 * the scheduler lock held and may release it around pure computation with
 * [`ProcessContext::compute`].
 *
 * A program must end each resumption by suspending (yield, sleep, exit or a
 * blocked wait). Returning without doing so is treated as timer preemption.
 */

use super::table::ProcHandle;
use super::types::{Channel, Exited, Perf, WaitOutcome};
use crate::core::errors::{invariant_violation, ProcessResult};
use crate::core::types::{CpuId, ExitStatus, Pid, Priority, Tick};
use crate::scheduler::{ContextSwitch, Cpu, Discipline, SchedCore, Scheduler};
use ahash::RandomState;
use dashmap::DashMap;
use log::{trace, warn};
use parking_lot::MutexGuard;

/// Code run by a process each time it is dispatched
pub trait Program: Send + Sync {
    fn resume(&mut self, ctx: &mut ProcessContext<'_, '_>);
}

impl<P: Program + ?Sized> Program for Box<P> {
    #[inline]
    fn resume(&mut self, ctx: &mut ProcessContext<'_, '_>) {
        (**self).resume(ctx)
    }
}

/// Program backed by a closure, see [`from_fn`]
pub struct FnProgram<F>(F);

impl<F> Program for FnProgram<F>
where
    F: FnMut(&mut ProcessContext<'_, '_>) + Send + Sync,
{
    #[inline]
    fn resume(&mut self, ctx: &mut ProcessContext<'_, '_>) {
        (self.0)(ctx)
    }
}

/// Wrap a closure as a [`Program`]
pub fn from_fn<F>(f: F) -> FnProgram<F>
where
    F: FnMut(&mut ProcessContext<'_, '_>) + Send + Sync,
{
    FnProgram(f)
}

/// Pid-indexed program registry implementing [`ContextSwitch`]
///
/// # Performance
/// - Sharded `DashMap` with ahash; a program is removed for the duration of
///   its run so no shard lock is held across user code
pub struct ProgramExecutor {
    programs: DashMap<Pid, Box<dyn Program>, RandomState>,
}

impl ProgramExecutor {
    pub fn new() -> Self {
        Self {
            programs: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Create the init process running `program`
    pub fn spawn_init(
        &self,
        scheduler: &Scheduler,
        name: &str,
        program: impl Program + 'static,
    ) -> ProcessResult<Pid> {
        let mut core = scheduler.lock();
        let handle = core.spawn_init(name)?;
        let pid = core.table().proc(handle).pid;
        self.programs.insert(pid, Box::new(program));
        Ok(pid)
    }

    /// Number of registered programs (live processes that have not exited)
    #[inline]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.programs.contains_key(&pid)
    }
}

impl Default for ProgramExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextSwitch for ProgramExecutor {
    fn switch_to(&self, cpu: &Cpu, core: &mut MutexGuard<'_, SchedCore>, proc: ProcHandle) {
        let pid = core.table().proc(proc).pid;
        let Some((_, mut program)) = self.programs.remove(&pid) else {
            warn!("pid {} has no program; yielding", pid);
            core.yield_now(proc);
            return;
        };

        trace!("cpu{} resuming pid {}", cpu.id(), pid);
        let mut ctx = ProcessContext {
            cpu,
            core,
            handle: proc,
            pid,
            programs: self,
            suspended: false,
            exited: false,
        };
        program.resume(&mut ctx);

        if !ctx.finish() {
            self.programs.insert(pid, program);
        }
    }
}

/// What a running program can do to itself and the system
///
/// Every operation that suspends the process (`yield_now`, `sleep_on`,
/// `exit`, a blocked `wait`/`wait_stat`/`sleep_until`) ends the program's
/// turn; any further operation in the same turn is fatal.
pub struct ProcessContext<'a, 'g> {
    cpu: &'a Cpu,
    core: &'a mut MutexGuard<'g, SchedCore>,
    handle: ProcHandle,
    pid: Pid,
    programs: &'a ProgramExecutor,
    suspended: bool,
    exited: bool,
}

impl ProcessContext<'_, '_> {
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn handle(&self) -> ProcHandle {
        self.handle
    }

    #[inline]
    pub fn cpu_id(&self) -> CpuId {
        self.cpu.id()
    }

    /// Clock ticks since boot
    #[inline]
    pub fn uptime(&self) -> Tick {
        self.core.uptime()
    }

    /// Whether a kill is pending for this process
    #[inline]
    pub fn killed(&self) -> bool {
        self.core.killed(self.handle)
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.core.table().proc(self.handle).priority
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Read-only access to the scheduler state
    #[inline]
    pub fn core(&self) -> &SchedCore {
        &**self.core
    }

    /// Run `f` with the scheduler lock released and interrupts on
    pub fn compute<R>(&mut self, f: impl FnOnce() -> R) -> R {
        self.ensure_active("compute");
        let cpu = self.cpu;
        MutexGuard::unlocked(&mut *self.core, || cpu.unmasked(f))
    }

    pub fn yield_now(&mut self) {
        self.ensure_active("yield");
        self.core.yield_now(self.handle);
        self.suspended = true;
    }

    pub fn sleep_on(&mut self, chan: Channel) {
        self.ensure_active("sleep");
        self.core.sleep(self.handle, chan);
        self.suspended = true;
    }

    pub fn exit(&mut self, status: ExitStatus) {
        self.ensure_active("exit");
        self.core.exit(self.handle, status);
        self.suspended = true;
        self.exited = true;
    }

    pub fn wait(&mut self) -> ProcessResult<WaitOutcome<Exited>> {
        self.ensure_active("wait");
        let outcome = self.core.wait(self.handle)?;
        self.suspended = outcome.is_blocked();
        Ok(outcome)
    }

    pub fn wait_stat(&mut self) -> ProcessResult<WaitOutcome<(Exited, Perf)>> {
        self.ensure_active("wait_stat");
        let outcome = self.core.wait_stat(self.handle)?;
        self.suspended = outcome.is_blocked();
        Ok(outcome)
    }

    /// Sleep until the clock reaches `deadline`
    pub fn sleep_until(&mut self, deadline: Tick) -> ProcessResult<WaitOutcome<()>> {
        self.ensure_active("sleep_until");
        let outcome = self.core.sleep_until(self.handle, deadline)?;
        self.suspended = outcome.is_blocked();
        Ok(outcome)
    }

    /// Create a child running `program`, returning its pid
    pub fn fork(&mut self, name: &str, program: impl Program + 'static) -> ProcessResult<Pid> {
        self.ensure_active("fork");
        let child = self.core.fork(self.handle, name)?;
        let pid = self.core.table().proc(child).pid;
        self.programs.programs.insert(pid, Box::new(program));
        Ok(pid)
    }

    pub fn kill(&mut self, pid: Pid) -> ProcessResult<()> {
        self.ensure_active("kill");
        self.core.kill(pid)
    }

    pub fn detach(&mut self, pid: Pid) -> ProcessResult<()> {
        self.ensure_active("detach");
        self.core.detach(self.handle, pid)
    }

    pub fn set_priority(&mut self, value: i32) -> bool {
        self.ensure_active("set_priority");
        self.core.set_priority(self.handle, value)
    }

    pub fn set_discipline(&mut self, discipline: Discipline) -> bool {
        self.ensure_active("set_discipline");
        self.core.set_discipline(discipline)
    }

    pub fn set_discipline_id(&mut self, id: i32) -> bool {
        self.ensure_active("set_discipline");
        self.core.set_discipline_id(id)
    }

    pub fn wakeup(&mut self, chan: Channel) -> usize {
        self.ensure_active("wakeup");
        self.core.wakeup(chan)
    }

    /// Close the turn, preempting a program that did not suspend itself
    ///
    /// Returns whether the process exited.
    fn finish(self) -> bool {
        if !self.suspended {
            trace!("pid {} preempted", self.pid);
            self.core.stats().inc_preemptions();
            self.core.yield_now(self.handle);
        }
        self.exited
    }

    #[track_caller]
    fn ensure_active(&self, op: &str) {
        if self.suspended {
            invariant_violation(format_args!("{} by pid {} after suspension", op, self.pid));
        }
    }
}
