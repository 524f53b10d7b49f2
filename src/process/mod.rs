/*!
 * Process Module
 * Process descriptors, the slot table, and the programs that run as processes
 */

pub mod program;
pub mod table;
pub mod types;

// Re-export for convenience
pub use program::{from_fn, FnProgram, ProcessContext, Program, ProgramExecutor};
pub use table::{ProcHandle, ProcessTable};
pub use types::{
    Accounting, Channel, Exited, Perf, Process, ProcessInfo, ProcessState, WaitOutcome,
};
