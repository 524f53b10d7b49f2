/*!
 * System Limits and Constants
 *
 * Centralized location for scheduler-wide limits and magic numbers.
 */

use super::types::Priority;

// =============================================================================
// PROCESS TABLE
// =============================================================================

/// Process table capacity
/// Fixed slot count; allocation fails once every slot is occupied
pub const NPROC: usize = 64;

/// Default number of simulated CPUs
pub const NCPU: usize = 8;

/// First pid handed out on a fresh table (the init process)
pub const FIRST_PID: u32 = 1;

// =============================================================================
// PRIORITY BOUNDS
// =============================================================================

/// Priority given to every freshly allocated process
pub const DEFAULT_PRIORITY: Priority = 5;

/// Upper bound for every discipline
pub const MAX_PRIORITY: Priority = 10;

/// Lower bound under RoundRobin and ExtendedPriority
pub const MIN_PRIORITY_RELAXED: Priority = 0;

/// Lower bound under plain Priority
/// A zero priority would never grow its accumulator and starve its peers
pub const MIN_PRIORITY_STRICT: Priority = 1;

// =============================================================================
// AGING
// =============================================================================

/// Dispatch ticks between aging passes under ExtendedPriority
pub const AGING_INTERVAL: u64 = 100;

/// Initial value of the dispatch tick counter
pub const FIRST_DISPATCH_TICK: u64 = 1;
