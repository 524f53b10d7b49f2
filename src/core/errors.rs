/*!
 * Error Types
 * Recoverable errors for callers outside the core, and the fatal halt path
 * for broken internal invariants
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Process table full ({0} slots)")]
    #[diagnostic(
        code(process::table_full),
        help("Every slot is occupied. Reap zombie children to free slots.")
    )]
    TableFull(usize),

    #[error("Process {0} not found")]
    #[diagnostic(
        code(process::not_found),
        help("The process may have been reaped or never existed. Check PID validity.")
    )]
    NotFound(Pid),

    #[error("Stale process handle (slot {slot}, generation {generation})")]
    #[diagnostic(
        code(process::stale_handle),
        help("The slot was released and reused since this handle was issued.")
    )]
    StaleHandle { slot: usize, generation: u32 },

    #[error("Process {0} has no children")]
    #[diagnostic(
        code(process::no_children),
        help("wait and wait_stat only succeed for callers with at least one child.")
    )]
    NoChildren(Pid),

    #[error("Process {child} is not a child of {parent}")]
    #[diagnostic(
        code(process::no_such_child),
        help("detach only applies to direct children of the caller.")
    )]
    NoSuchChild { parent: Pid, child: Pid },

    #[error("Process {0} was killed")]
    #[diagnostic(
        code(process::killed),
        help("The caller has a pending kill and must exit at its next checkpoint.")
    )]
    Killed(Pid),
}

/// Halt on a broken scheduler invariant
///
/// State behind the scheduler lock can no longer be trusted once one of
/// these fires, so there is no recoverable continuation.
#[cold]
#[inline(never)]
#[track_caller]
pub fn invariant_violation(what: impl std::fmt::Display) -> ! {
    log::error!("scheduler invariant violated: {}", what);
    panic!("scheduler invariant violated: {}", what);
}
