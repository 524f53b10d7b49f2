/*!
 * Process Types
 * Descriptor, lifecycle state and accounting for process table slots
 */

use super::table::ProcHandle;
use crate::core::limits::DEFAULT_PRIORITY;
use crate::core::types::{Accumulator, ExitStatus, Pid, Priority, Tick};
use serde::{Deserialize, Serialize};

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Free slot
    #[default]
    Unused,
    /// Slot claimed, not yet schedulable
    Embryo,
    /// Blocked on a wait channel
    Sleeping,
    /// In the active ready queue
    Runnable,
    /// Dispatched on some CPU
    Running,
    /// Exited, waiting to be reaped
    Zombie,
}

impl ProcessState {
    /// Short label for process listings
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Embryo => "embryo",
            Self::Sleeping => "sleep",
            Self::Runnable => "runble",
            Self::Running => "run",
            Self::Zombie => "zombie",
        }
    }
}

/// Something a sleeping process waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Parent waiting for a child of the given pid to become a zombie
    Reap(Pid),
    /// Clock tick
    Timer,
    /// Arbitrary event key
    Event(u64),
}

/// Tick accounting attached to every state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accounting {
    /// Clock tick of the last entry into Runnable
    pub ready_since: Tick,
    /// Clock tick of the last dispatch
    pub run_since: Tick,
    /// Clock tick of the last entry into Sleeping
    pub sleep_since: Tick,
    /// Creation time
    pub ctime: Tick,
    /// Termination time
    pub ttime: Tick,
    /// Cumulative ready time
    pub retime: Tick,
    /// Cumulative run time
    pub rutime: Tick,
    /// Cumulative sleep time
    pub stime: Tick,
}

impl Accounting {
    /// Accounting fields for a slot claimed at `now`
    #[inline]
    pub fn created_at(now: Tick) -> Self {
        Self {
            ctime: now,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn perf(&self) -> Perf {
        Perf {
            ctime: self.ctime,
            ttime: self.ttime,
            stime: self.stime,
            retime: self.retime,
            rutime: self.rutime,
        }
    }
}

/// Accounting snapshot returned by `wait_stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Perf {
    pub ctime: Tick,
    pub ttime: Tick,
    pub stime: Tick,
    pub retime: Tick,
    pub rutime: Tick,
}

/// Process descriptor, one per table slot
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    /// Weak back-reference; the table owns every descriptor
    pub parent: Option<ProcHandle>,
    pub state: ProcessState,
    pub priority: Priority,
    pub accumulator: Accumulator,
    /// Dispatch tick at which the process last stopped running or became ready
    pub bedtime: Option<Tick>,
    pub killed: bool,
    pub chan: Option<Channel>,
    pub exit_status: ExitStatus,
    pub times: Accounting,
}

impl Process {
    /// Descriptor of a free slot
    pub fn unused() -> Self {
        Self {
            pid: 0,
            name: String::new(),
            parent: None,
            state: ProcessState::Unused,
            priority: DEFAULT_PRIORITY,
            accumulator: 0,
            bedtime: None,
            killed: false,
            chan: None,
            exit_status: 0,
            times: Accounting::default(),
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_runnable(&self) -> bool {
        matches!(self.state, ProcessState::Runnable)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_zombie(&self) -> bool {
        matches!(self.state, ProcessState::Zombie)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_unused(&self) -> bool {
        matches!(self.state, ProcessState::Unused)
    }
}

impl Default for Process {
    fn default() -> Self {
        Self::unused()
    }
}

/// Read-only view of a descriptor for listings and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Pid>,
    pub priority: Priority,
    pub accumulator: Accumulator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<Tick>,
    pub killed: bool,
    pub perf: Perf,
}

/// Reaped child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Exited {
    pub pid: Pid,
    pub status: ExitStatus,
}

/// Outcome of an operation that may put the caller to sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WaitOutcome<T> {
    /// Completed without blocking
    Ready(T),
    /// Caller is now Sleeping; retry after it is dispatched again
    Blocked,
}

impl<T> WaitOutcome<T> {
    #[inline]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Blocked => None,
        }
    }

    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WaitOutcome<U> {
        match self {
            Self::Ready(value) => WaitOutcome::Ready(f(value)),
            Self::Blocked => WaitOutcome::Blocked,
        }
    }

    #[inline]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}
