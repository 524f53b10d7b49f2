/*!
 * Syscall Handler
 * Marshals user syscall numbers onto the running process's context
 */

use super::types::{Syscall, SyscallResult};
use crate::process::{ProcessContext, WaitOutcome};
use log::debug;

/// Offset between user discipline numbers (1..=3) and discipline ids (0..=2)
pub const POLICY_BASE: i32 = 1;

impl ProcessContext<'_, '_> {
    /// Execute `syscall` on behalf of this process
    pub fn syscall(&mut self, syscall: Syscall) -> SyscallResult {
        debug!("pid {} syscall {}", self.pid(), syscall.name());
        match syscall {
            Syscall::Exit { status } => {
                self.exit(status);
                SyscallResult::success()
            }
            Syscall::Wait => match self.wait() {
                Ok(WaitOutcome::Ready(exited)) => {
                    SyscallResult::reaped(exited.pid, exited.status, None)
                }
                Ok(WaitOutcome::Blocked) => SyscallResult::Blocked,
                Err(e) => SyscallResult::error(e.to_string()),
            },
            Syscall::WaitStat => match self.wait_stat() {
                Ok(WaitOutcome::Ready((exited, perf))) => {
                    SyscallResult::reaped(exited.pid, exited.status, Some(perf))
                }
                Ok(WaitOutcome::Blocked) => SyscallResult::Blocked,
                Err(e) => SyscallResult::error(e.to_string()),
            },
            Syscall::Kill { target_pid } => match self.kill(target_pid) {
                Ok(()) => SyscallResult::success(),
                Err(e) => SyscallResult::error(e.to_string()),
            },
            Syscall::Detach { target_pid } => match self.detach(target_pid) {
                Ok(()) => SyscallResult::success(),
                Err(e) => SyscallResult::error(e.to_string()),
            },
            // Out-of-range values are ignored without an error
            Syscall::Policy { policy } => {
                self.set_discipline_id(policy.saturating_sub(POLICY_BASE));
                SyscallResult::success()
            }
            Syscall::Priority { priority } => {
                self.set_priority(priority);
                SyscallResult::success()
            }
            Syscall::GetPid => SyscallResult::value(i64::from(self.pid())),
            Syscall::Uptime => SyscallResult::value(self.uptime() as i64),
            Syscall::Yield => {
                self.yield_now();
                SyscallResult::success()
            }
        }
    }
}
