/*!
 * Shared helpers for scheduler integration tests
 */

use kernel_sched::{Channel, Discipline, ProcHandle, SchedCore, Scheduler, SchedulerConfig};

pub fn scheduler(discipline: Discipline, cpus: usize) -> Scheduler {
    Scheduler::new(
        SchedulerConfig::default()
            .with_nproc(32)
            .with_cpus(cpus)
            .with_discipline(discipline),
    )
}

/// Init created, dispatched once and parked on `Event(0)`
pub fn boot(core: &mut SchedCore) -> ProcHandle {
    let init = core.spawn_init("init").unwrap();
    let picked = core.dispatch_next().unwrap();
    assert_eq!(picked, init);
    core.begin_run(0, init);
    core.sleep(init, Channel::Event(0));
    core.end_run(0, init);
    init
}

/// Dispatch the next process on cpu 0 and yield it straight back
pub fn cycle(core: &mut SchedCore) -> ProcHandle {
    let h = core.dispatch_next().expect("ready queue empty");
    core.begin_run(0, h);
    core.yield_now(h);
    core.end_run(0, h);
    h
}

pub fn pid(core: &SchedCore, h: ProcHandle) -> u32 {
    core.table().proc(h).pid
}
