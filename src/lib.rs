/*!
 * Kernel Scheduler Library
 * Multiprocessor process scheduling core with runtime-switchable disciplines
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;
pub mod syscalls;

// Re-exports
pub use self::core::errors::{ProcessError, ProcessResult};
pub use self::core::types::{Accumulator, CpuId, ExitStatus, Pid, Priority, Tick};
pub use monitoring::init_tracing;
pub use process::{
    from_fn, Channel, Exited, Perf, ProcHandle, ProcessContext, ProcessInfo, ProcessState,
    Program, ProgramExecutor, WaitOutcome,
};
pub use scheduler::{
    ContextSwitch, Cpu, Discipline, SchedCore, Scheduler, SchedulerConfig, SchedulerStats,
};
pub use syscalls::{Syscall, SyscallResult};
