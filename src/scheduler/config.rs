/*!
 * Scheduler Configuration
 * Table size, CPU count and boot discipline
 */

use super::policy::Discipline;
use crate::core::limits::{NCPU, NPROC};
use log::warn;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the process table size
pub const ENV_NPROC: &str = "KERNEL_SCHED_NPROC";
/// Environment variable overriding the CPU count
pub const ENV_CPUS: &str = "KERNEL_SCHED_CPUS";
/// Environment variable selecting the boot discipline
pub const ENV_POLICY: &str = "KERNEL_SCHED_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Process table capacity
    pub nproc: usize,
    /// Number of CPUs running the dispatch loop
    pub cpus: usize,
    /// Discipline active at boot
    pub discipline: Discipline,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            nproc: NPROC,
            cpus: NCPU,
            discipline: Discipline::RoundRobin,
        }
    }
}

impl SchedulerConfig {
    #[inline]
    #[must_use]
    pub fn with_nproc(mut self, nproc: usize) -> Self {
        self.nproc = nproc.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = cpus.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    /// Defaults overridden by `KERNEL_SCHED_*` variables; bad values are
    /// logged and ignored
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(nproc) = read_env::<usize>(ENV_NPROC) {
            config = config.with_nproc(nproc);
        }
        if let Some(cpus) = read_env::<usize>(ENV_CPUS) {
            config = config.with_cpus(cpus);
        }
        if let Some(discipline) = read_env::<Discipline>(ENV_POLICY) {
            config = config.with_discipline(discipline);
        }

        config
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        let (nproc, cpus) = (config.nproc, config.cpus);
        Ok(config.with_nproc(nproc).with_cpus(cpus))
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
