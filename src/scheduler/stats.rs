/*!
 * Lock-Free Scheduler Statistics
 * Atomic counters readable without taking the scheduler lock
 */

use super::policy::Discipline;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Scheduler statistics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    pub total_dispatched: u64,
    pub context_switches: u64,
    pub preemptions: u64,
    pub aging_overrides: u64,
    pub discipline_switches: u64,
    pub runnable: usize,
    pub discipline: Discipline,
}

/// Atomic scheduler statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
pub struct AtomicSchedulerStats {
    total_dispatched: AtomicU64,
    context_switches: AtomicU64,
    preemptions: AtomicU64,
    aging_overrides: AtomicU64,
    discipline_switches: AtomicU64,
    runnable: AtomicUsize,
    // Changes rarely
    discipline: parking_lot::RwLock<Discipline>,
}

impl AtomicSchedulerStats {
    #[inline]
    pub fn new(discipline: Discipline) -> Self {
        Self {
            total_dispatched: AtomicU64::new(0),
            context_switches: AtomicU64::new(0),
            preemptions: AtomicU64::new(0),
            aging_overrides: AtomicU64::new(0),
            discipline_switches: AtomicU64::new(0),
            runnable: AtomicUsize::new(0),
            discipline: parking_lot::RwLock::new(discipline),
        }
    }

    /// Hot path - called on every dispatch
    #[inline(always)]
    pub fn inc_dispatched(&self) {
        self.total_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_aging_overrides(&self) {
        self.aging_overrides.fetch_add(1, Ordering::Relaxed);
    }

    /// Mirror the ready-queue length after a change
    #[inline(always)]
    pub fn set_runnable(&self, count: usize) {
        self.runnable.store(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_discipline(&self, discipline: Discipline) {
        *self.discipline.write() = discipline;
        self.discipline_switches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    ///
    /// # Note
    /// Counters may be mutually inconsistent under concurrent updates, but
    /// each individual value is accurate.
    #[inline]
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            total_dispatched: self.total_dispatched.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            aging_overrides: self.aging_overrides.load(Ordering::Relaxed),
            discipline_switches: self.discipline_switches.load(Ordering::Relaxed),
            runnable: self.runnable.load(Ordering::Relaxed),
            discipline: *self.discipline.read(),
        }
    }
}
