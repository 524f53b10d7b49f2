/*!
 * Core Types
 * Common types used across the scheduling core
 */

/// Process ID type
pub type Pid = u32;

/// Priority level (0-10, bounded per discipline)
pub type Priority = u8;

/// Fair-share accumulator (signed, wide)
pub type Accumulator = i64;

/// Logical time: either a clock tick or a dispatch tick
pub type Tick = u64;

/// Logical CPU index
pub type CpuId = usize;

/// Exit status reported by a terminating process
pub type ExitStatus = i32;
