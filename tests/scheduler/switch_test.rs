/*!
 * Discipline Switch Tests
 * Membership and count conservation across live policy changes
 */

use super::common::{boot, cycle, scheduler};
use kernel_sched::{Channel, Discipline, ProcessState};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_round_robin_priority_round_trip() {
    let sched = scheduler(Discipline::RoundRobin, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);
    let p1 = core.fork(init, "p1").unwrap();
    let p2 = core.fork(init, "p2").unwrap();

    assert!(core.set_discipline(Discipline::Priority));
    cycle(&mut core);
    cycle(&mut core);
    cycle(&mut core);
    assert!(core.set_discipline(Discipline::RoundRobin));

    assert_eq!(core.table().proc(p1).accumulator, 0);
    assert_eq!(core.table().proc(p2).accumulator, 0);
    let mut members = core.ready_handles();
    members.sort();
    assert_eq!(members, vec![p1, p2]);
    core.verify();
}

#[test]
fn test_every_direction_conserves_runnable_count() {
    for from in Discipline::ALL {
        for to in Discipline::ALL {
            if from == to {
                continue;
            }
            let sched = scheduler(from, 1);
            let mut core = sched.lock();
            let init = boot(&mut core);
            for i in 0..6 {
                core.fork(init, &format!("w{}", i)).unwrap();
            }
            cycle(&mut core);

            let before = core.table().count(ProcessState::Runnable);
            assert!(core.set_discipline(to), "{} -> {}", from, to);
            assert_eq!(core.table().count(ProcessState::Runnable), before);
            assert_eq!(core.ready_len(), before);
            core.verify();
        }
    }
}

#[test]
fn test_switch_via_scheduler_handle() {
    let sched = scheduler(Discipline::RoundRobin, 1);
    sched.spawn_init("init").unwrap();

    assert!(sched.set_discipline(Discipline::ExtendedPriority));
    assert!(!sched.set_discipline_id(7));
    let stats = sched.stats();
    assert_eq!(stats.discipline, Discipline::ExtendedPriority);
    assert_eq!(stats.discipline_switches, 1);
    assert_eq!(stats.runnable, 1);
}

#[derive(Debug, Clone)]
enum Op {
    Fork,
    Cycle,
    Sleep,
    Wake,
    Switch(i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Fork),
        4 => Just(Op::Cycle),
        1 => Just(Op::Sleep),
        1 => Just(Op::Wake),
        2 => (0i32..3).prop_map(Op::Switch),
    ]
}

proptest! {
    #[test]
    fn prop_random_workload_keeps_placement(ops in prop::collection::vec(op(), 1..80)) {
        let sched = scheduler(Discipline::RoundRobin, 1);
        let mut core = sched.lock();
        let init = boot(&mut core);

        for op in ops {
            match op {
                Op::Fork => {
                    let _ = core.fork(init, "w");
                }
                Op::Cycle => {
                    if !core.is_ready_empty() {
                        cycle(&mut core);
                    }
                }
                Op::Sleep => {
                    if let Some(h) = core.dispatch_next() {
                        core.begin_run(0, h);
                        core.sleep(h, Channel::Event(1));
                        core.end_run(0, h);
                    }
                }
                Op::Wake => {
                    core.wakeup(Channel::Event(1));
                }
                Op::Switch(id) => {
                    let before = core.table().count(ProcessState::Runnable);
                    core.set_discipline_id(id);
                    prop_assert_eq!(core.table().count(ProcessState::Runnable), before);
                }
            }
            core.verify();
            prop_assert_eq!(core.ready_len(), core.table().count(ProcessState::Runnable));
        }
    }
}
