/*!
 * Dispatch Order Tests
 * FIFO and accumulator ordering observed through the public core API
 */

use super::common::{boot, cycle, pid, scheduler};
use kernel_sched::{Discipline, ProcessState};
use pretty_assertions::assert_eq;

#[test]
fn test_three_priorities_after_one_round() {
    let sched = scheduler(Discipline::Priority, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);

    let p1 = core.fork(init, "p1").unwrap();
    let p2 = core.fork(init, "p2").unwrap();
    let p3 = core.fork(init, "p3").unwrap();
    // Each one runs once to set its own priority, all tied at 0 before
    for (h, prio) in [(p1, 3), (p2, 5), (p3, 1)] {
        let next = core.dispatch_next().unwrap();
        assert_eq!(next, h);
        core.begin_run(0, next);
        assert!(core.set_priority(h, prio));
        core.yield_now(h);
        core.end_run(0, h);
    }

    // One full round done: accumulators are 3, 5, 1
    assert_eq!(core.table().proc(p1).accumulator, 3);
    assert_eq!(core.table().proc(p2).accumulator, 5);
    assert_eq!(core.table().proc(p3).accumulator, 1);

    let order: Vec<_> = (0..3)
        .map(|_| {
            let h = core.dispatch_next().unwrap();
            core.begin_run(0, h);
            // Park them so the next pick sees the remaining two only
            core.sleep(h, kernel_sched::Channel::Event(7));
            core.end_run(0, h);
            pid(&core, h)
        })
        .collect();
    assert_eq!(order, vec![pid(&core, p3), pid(&core, p1), pid(&core, p2)]);
    core.verify();
}

#[test]
fn test_round_robin_rotation() {
    let sched = scheduler(Discipline::RoundRobin, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);
    let handles: Vec<_> = (0..5)
        .map(|i| core.fork(init, &format!("w{}", i)).unwrap())
        .collect();

    for round in 0..3 {
        for &expected in &handles {
            assert_eq!(cycle(&mut core), expected, "round {}", round);
        }
    }
    assert_eq!(core.context().dispatch_tick, 1 + 1 + 15);
}

#[test]
fn test_accumulators_never_decrease_while_yielding() {
    let sched = scheduler(Discipline::Priority, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);
    let handles: Vec<_> = (0..4)
        .map(|i| core.fork(init, &format!("w{}", i)).unwrap())
        .collect();
    for (i, &h) in handles.iter().enumerate() {
        let next = core.dispatch_next().unwrap();
        core.begin_run(0, next);
        core.set_priority(h, (i as i32) * 3 + 1);
        core.yield_now(next);
        core.end_run(0, next);
    }

    let mut last: Vec<i64> = handles
        .iter()
        .map(|&h| core.table().proc(h).accumulator)
        .collect();
    for _ in 0..200 {
        cycle(&mut core);
        for (i, &h) in handles.iter().enumerate() {
            let acc = core.table().proc(h).accumulator;
            assert!(acc >= last[i]);
            last[i] = acc;
        }
    }
    assert!(handles
        .iter()
        .all(|&h| core.table().proc(h).state == ProcessState::Runnable));
}
