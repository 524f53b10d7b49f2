/*!
 * Scheduling Disciplines
 * The closed set of ready-queue rules and the bounds/counters they govern
 */

use crate::core::limits::{
    FIRST_DISPATCH_TICK, MAX_PRIORITY, MIN_PRIORITY_RELAXED, MIN_PRIORITY_STRICT,
};
use crate::core::types::{Priority, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Active ready-queue discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    /// FIFO ready queue
    #[default]
    RoundRobin,
    /// Smallest accumulator first
    Priority,
    /// Smallest accumulator first, with a periodic aging override
    ExtendedPriority,
}

impl Discipline {
    pub const ALL: [Self; 3] = [Self::RoundRobin, Self::Priority, Self::ExtendedPriority];

    /// Numeric identifier used by `set_discipline_id`
    #[inline]
    pub const fn id(self) -> i32 {
        match self {
            Self::RoundRobin => 0,
            Self::Priority => 1,
            Self::ExtendedPriority => 2,
        }
    }

    /// Parse a numeric identifier, `None` when out of range
    #[inline]
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::RoundRobin),
            1 => Some(Self::Priority),
            2 => Some(Self::ExtendedPriority),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Priority => "priority",
            Self::ExtendedPriority => "extended_priority",
        }
    }

    /// Whether the ready queue is ordered by accumulator
    #[inline(always)]
    pub const fn uses_accumulator(self) -> bool {
        !matches!(self, Self::RoundRobin)
    }

    /// Lowest priority a process may request under this discipline
    #[inline]
    pub const fn min_priority(self) -> Priority {
        match self {
            Self::Priority => MIN_PRIORITY_STRICT,
            Self::RoundRobin | Self::ExtendedPriority => MIN_PRIORITY_RELAXED,
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round_robin" | "roundrobin" | "rr" => Ok(Self::RoundRobin),
            "priority" | "prio" | "pq" => Ok(Self::Priority),
            "extended_priority" | "extendedpriority" | "eprio" | "epq" => {
                Ok(Self::ExtendedPriority)
            }
            _ => Err(format!(
                "Invalid discipline '{}'. Valid: round_robin, priority, extended_priority",
                s
            )),
        }
    }
}

/// Scheduler-wide policy state, owned by the locked core
#[derive(Debug, Clone)]
pub struct SchedContext {
    pub discipline: Discipline,
    pub min_priority: Priority,
    pub max_priority: Priority,
    /// Incremented once per dispatch decision; drives aging and bedtime
    pub dispatch_tick: Tick,
    /// Timer-driven clock used for accounting
    pub clock: Tick,
}

impl SchedContext {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            min_priority: discipline.min_priority(),
            max_priority: MAX_PRIORITY,
            dispatch_tick: FIRST_DISPATCH_TICK,
            clock: 0,
        }
    }

    /// Whether `value` is an acceptable priority right now
    #[inline]
    pub fn admits(&self, value: i32) -> bool {
        value >= i32::from(self.min_priority) && value <= i32::from(self.max_priority)
    }
}
