/*!
 * Syscalls Module
 * Thin user-number shim over the process context
 */

mod handler;
mod types;

// Re-export public API
pub use handler::POLICY_BASE;
pub use types::{Syscall, SyscallResult};
