/*!
 * Syscall Types
 * User-facing syscall numbers and their results
 */

use crate::core::types::{ExitStatus, Pid};
use crate::process::Perf;
use serde::{Deserialize, Serialize};

/// System call result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyscallResult {
    Success {
        value: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_status: Option<ExitStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        perf: Option<Perf>,
    },
    Error {
        message: String,
    },
    /// Caller is asleep; reissue the call once dispatched again
    Blocked,
}

impl SyscallResult {
    pub fn success() -> Self {
        Self::value(0)
    }

    pub fn value(value: i64) -> Self {
        Self::Success {
            value,
            exit_status: None,
            perf: None,
        }
    }

    pub fn reaped(pid: Pid, status: ExitStatus, perf: Option<Perf>) -> Self {
        Self::Success {
            value: i64::from(pid),
            exit_status: Some(status),
            perf,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Register value a user process would see: the value, or -1 on error
    ///
    /// `None` while blocked.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Success { value, .. } => Some(*value),
            Self::Error { .. } => Some(-1),
            Self::Blocked => None,
        }
    }
}

/// System call types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "syscall", rename_all = "snake_case")]
pub enum Syscall {
    Exit { status: ExitStatus },
    Wait,
    WaitStat,
    Kill { target_pid: Pid },
    Detach { target_pid: Pid },
    /// User discipline number, 1 through 3
    Policy { policy: i32 },
    Priority { priority: i32 },
    GetPid,
    Uptime,
    Yield,
}

impl Syscall {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Exit { .. } => "exit",
            Self::Wait => "wait",
            Self::WaitStat => "wait_stat",
            Self::Kill { .. } => "kill",
            Self::Detach { .. } => "detach",
            Self::Policy { .. } => "policy",
            Self::Priority { .. } => "priority",
            Self::GetPid => "getpid",
            Self::Uptime => "uptime",
            Self::Yield => "yield",
        }
    }
}
