/*!
 * Process Lifecycle
 *
 * Scheduling-relevant state transitions: creation, exit, reaping,
 * reparenting, sleep/wakeup on channels, kill and the timer clock.
 *
 * Blocking operations never block the host thread. A caller that must wait
 * is put to Sleeping and gets [`WaitOutcome::Blocked`]; it retries the call
 * when it is next dispatched.
 */

use super::SchedCore;
use crate::core::errors::{invariant_violation, ProcessError, ProcessResult};
use crate::core::types::{ExitStatus, Pid, Tick};
use crate::process::{Channel, Exited, Perf, ProcHandle, ProcessState, WaitOutcome};
use log::{debug, info};

impl SchedCore {
    /// Create the root process every orphan is passed to
    pub fn spawn_init(&mut self, name: &str) -> ProcessResult<ProcHandle> {
        if let Some(existing) = self.init {
            invariant_violation(format_args!("init already exists at {}", existing));
        }
        let handle = self.allocate(name, None)?;
        self.init = Some(handle);
        info!("Spawned init process {} ({})", self.table.proc(handle).pid, name);
        Ok(handle)
    }

    /// Create a child of `parent` and hand it to the active discipline
    pub fn fork(&mut self, parent: ProcHandle, name: &str) -> ProcessResult<ProcHandle> {
        let parent_pid = self.table.checked(parent)?.pid;
        let handle = self.allocate(name, Some(parent))?;
        info!(
            "Forked pid {} ({}) from pid {}",
            self.table.proc(handle).pid,
            name,
            parent_pid
        );
        Ok(handle)
    }

    fn allocate(&mut self, name: &str, parent: Option<ProcHandle>) -> ProcessResult<ProcHandle> {
        let handle = self
            .table
            .allocate(name, self.ctx.clock, self.ctx.dispatch_tick)?;
        let p = self.table.proc_mut(handle);
        p.parent = parent;
        p.state = ProcessState::Runnable;
        self.mark_runnable(handle, true);
        Ok(handle)
    }

    /// Give up the CPU, staying Runnable
    pub fn yield_now(&mut self, handle: ProcHandle) {
        self.expect_running(handle, "yield");
        self.table.proc_mut(handle).state = ProcessState::Runnable;
        self.mark_runnable(handle, false);
    }

    /// Put a running process to sleep on `chan`
    pub fn sleep(&mut self, handle: ProcHandle, chan: Channel) {
        self.expect_running(handle, "sleep");
        let now = self.ctx.clock;
        let tick = self.ctx.dispatch_tick;

        let p = self.table.proc_mut(handle);
        p.times.rutime += now.saturating_sub(p.times.run_since);
        p.times.sleep_since = now;
        p.bedtime = Some(tick);
        p.chan = Some(chan);
        p.state = ProcessState::Sleeping;
        debug!("pid {} sleeping on {:?}", p.pid, chan);
    }

    /// Wake every process sleeping on `chan`, returning how many woke
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let sleepers: Vec<ProcHandle> = self
            .table
            .iter()
            .filter(|(_, p)| p.state == ProcessState::Sleeping && p.chan == Some(chan))
            .map(|(h, _)| h)
            .collect();

        for &handle in &sleepers {
            self.make_ready_from_sleep(handle);
        }
        sleepers.len()
    }

    fn make_ready_from_sleep(&mut self, handle: ProcHandle) {
        let now = self.ctx.clock;
        let p = self.table.proc_mut(handle);
        p.times.stime += now.saturating_sub(p.times.sleep_since);
        p.chan = None;
        p.state = ProcessState::Runnable;
        self.mark_runnable(handle, true);
    }

    /// Terminate a running process
    ///
    /// Children are passed to init. The parent is woken if it waits in
    /// `wait`; init is woken if any passed child is already a zombie.
    pub fn exit(&mut self, handle: ProcHandle, status: ExitStatus) {
        let init = match self.init {
            Some(init) if init != handle => init,
            _ => invariant_violation("init exiting"),
        };
        self.expect_running(handle, "exit");

        if let Some(parent) = self.table.proc(handle).parent {
            let parent_pid = self.table.proc(parent).pid;
            self.wakeup(Channel::Reap(parent_pid));
        }

        let mut orphaned_zombie = false;
        for (_, p) in self.table.iter_mut() {
            if p.parent == Some(handle) {
                p.parent = Some(init);
                orphaned_zombie |= p.is_zombie();
            }
        }
        if orphaned_zombie {
            let init_pid = self.table.proc(init).pid;
            self.wakeup(Channel::Reap(init_pid));
        }

        let now = self.ctx.clock;
        let p = self.table.proc_mut(handle);
        p.times.rutime += now.saturating_sub(p.times.run_since);
        p.times.ttime = now;
        p.exit_status = status;
        p.bedtime = None;
        p.state = ProcessState::Zombie;
        info!("pid {} exited with status {}", p.pid, status);
    }

    /// Reap one zombie child of `caller`
    pub fn wait(&mut self, caller: ProcHandle) -> ProcessResult<WaitOutcome<Exited>> {
        Ok(self.reap(caller)?.map(|(exited, _)| exited))
    }

    /// Reap one zombie child of `caller`, returning its accounting too
    pub fn wait_stat(&mut self, caller: ProcHandle) -> ProcessResult<WaitOutcome<(Exited, Perf)>> {
        self.reap(caller)
    }

    fn reap(&mut self, caller: ProcHandle) -> ProcessResult<WaitOutcome<(Exited, Perf)>> {
        let caller_pid = self.table.checked(caller)?.pid;

        let mut have_children = false;
        let mut zombie = None;
        for (h, p) in self.table.iter() {
            if p.parent != Some(caller) {
                continue;
            }
            have_children = true;
            if p.is_zombie() {
                zombie = Some(h);
                break;
            }
        }

        if let Some(child) = zombie {
            let p = self.table.proc_mut(child);
            p.parent = None;
            let exited = Exited {
                pid: p.pid,
                status: p.exit_status,
            };
            let perf = p.times.perf();
            self.table.release(child);
            info!("pid {} reaped child {}", caller_pid, exited.pid);
            return Ok(WaitOutcome::Ready((exited, perf)));
        }

        if !have_children {
            return Err(ProcessError::NoChildren(caller_pid));
        }
        if self.table.proc(caller).killed {
            return Err(ProcessError::Killed(caller_pid));
        }

        self.sleep(caller, Channel::Reap(caller_pid));
        Ok(WaitOutcome::Blocked)
    }

    /// Pass child `pid` of `caller` to init
    pub fn detach(&mut self, caller: ProcHandle, pid: Pid) -> ProcessResult<()> {
        let caller_pid = self.table.checked(caller)?.pid;
        let init = self
            .init
            .unwrap_or_else(|| invariant_violation("detach before init exists"));

        let child = self
            .table
            .iter()
            .find(|(_, p)| p.pid == pid && p.parent == Some(caller))
            .map(|(h, _)| h)
            .ok_or(ProcessError::NoSuchChild {
                parent: caller_pid,
                child: pid,
            })?;

        let p = self.table.proc_mut(child);
        p.parent = Some(init);
        let is_zombie = p.is_zombie();
        if is_zombie {
            let init_pid = self.table.proc(init).pid;
            self.wakeup(Channel::Reap(init_pid));
        }
        debug!("pid {} detached child {}", caller_pid, pid);
        Ok(())
    }

    /// Flag `pid` for termination, forcing it Runnable if asleep
    pub fn kill(&mut self, pid: Pid) -> ProcessResult<()> {
        let handle = self
            .table
            .iter()
            .find(|(_, p)| p.pid == pid && !p.is_zombie())
            .map(|(h, _)| h)
            .ok_or(ProcessError::NotFound(pid))?;

        let p = self.table.proc_mut(handle);
        p.killed = true;
        let asleep = p.state == ProcessState::Sleeping;
        if asleep {
            self.make_ready_from_sleep(handle);
        }
        info!("Killed pid {}", pid);
        Ok(())
    }

    /// Whether a kill is pending for `handle`
    pub fn killed(&self, handle: ProcHandle) -> bool {
        self.table.get(handle).is_some_and(|p| p.killed)
    }

    /// Sleep on the timer until the clock reaches `deadline`
    pub fn sleep_until(
        &mut self,
        handle: ProcHandle,
        deadline: Tick,
    ) -> ProcessResult<WaitOutcome<()>> {
        if self.ctx.clock >= deadline {
            return Ok(WaitOutcome::Ready(()));
        }
        let p = self.table.checked(handle)?;
        if p.killed {
            return Err(ProcessError::Killed(p.pid));
        }
        self.sleep(handle, Channel::Timer);
        Ok(WaitOutcome::Blocked)
    }

    /// Timer interrupt: advance the clock and wake timer sleepers
    pub fn clock_tick(&mut self) -> Tick {
        self.ctx.clock += 1;
        self.wakeup(Channel::Timer);
        self.ctx.clock
    }

    #[track_caller]
    fn expect_running(&self, handle: ProcHandle, op: &str) {
        let p = self.table.proc(handle);
        if p.state != ProcessState::Running {
            invariant_violation(format_args!("{} by pid {} in state {:?}", op, p.pid, p.state));
        }
    }
}
