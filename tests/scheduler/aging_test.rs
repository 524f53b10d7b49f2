/*!
 * Aging Tests
 * Bounded waiting under the extended priority discipline
 */

use super::common::{boot, cycle, pid, scheduler};
use kernel_sched::core::limits::AGING_INTERVAL;
use kernel_sched::Discipline;
use pretty_assertions::assert_eq;
use std::collections::HashMap;

#[test]
fn test_starved_process_runs_within_aging_window() {
    let sched = scheduler(Discipline::ExtendedPriority, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);

    // heavy pays 10 per run, light pays nothing and always wins extract-min
    let heavy = core.fork(init, "heavy").unwrap();
    let light = core.fork(init, "light").unwrap();
    assert!(core.set_priority(heavy, 10));
    assert!(core.set_priority(light, 0));

    let mut last_run = core.context().dispatch_tick;
    let mut longest_gap = 0;
    for _ in 0..(3 * AGING_INTERVAL) {
        let tick = core.context().dispatch_tick;
        if cycle(&mut core) == heavy {
            longest_gap = longest_gap.max(tick - last_run);
            last_run = tick;
        }
    }

    assert!(longest_gap > 0);
    assert!(longest_gap <= AGING_INTERVAL, "gap {}", longest_gap);
    assert!(core.stats().snapshot().aging_overrides >= 2);
}

#[test]
fn test_every_starved_process_takes_a_turn() {
    let sched = scheduler(Discipline::ExtendedPriority, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);

    let heavy = core.fork(init, "heavy").unwrap();
    assert!(core.set_priority(heavy, 10));
    let light: Vec<_> = (0..3)
        .map(|i| {
            let h = core.fork(init, &format!("light{}", i)).unwrap();
            assert!(core.set_priority(h, 0));
            h
        })
        .collect();

    // light0 wins every accumulator tie, so the other three only run when aged
    let starved = [heavy, light[1], light[2]];
    let bound = starved.len() as u64 * AGING_INTERVAL;

    let start = core.context().dispatch_tick;
    let mut last_run: HashMap<_, _> = starved.iter().map(|&h| (h, start)).collect();
    let mut runs: HashMap<_, usize> = HashMap::new();
    for _ in 0..(4 * AGING_INTERVAL) {
        let tick = core.context().dispatch_tick;
        let h = cycle(&mut core);
        *runs.entry(h).or_default() += 1;
        if let Some(last) = last_run.get_mut(&h) {
            assert!(tick - *last <= bound, "{} waited {}", pid(&core, h), tick - *last);
            *last = tick;
        }
    }

    let end = core.context().dispatch_tick;
    for &h in &starved {
        assert!(runs.get(&h).copied().unwrap_or(0) >= 1, "{} never ran", pid(&core, h));
        assert!(end - last_run[&h] <= bound);
    }
    assert!(runs[&light[0]] > runs[&heavy]);
    assert_eq!(core.stats().snapshot().aging_overrides, 4);
}

#[test]
fn test_plain_priority_has_no_aging() {
    let sched = scheduler(Discipline::Priority, 1);
    let mut core = sched.lock();
    let init = boot(&mut core);
    let heavy = core.fork(init, "heavy").unwrap();
    let light = core.fork(init, "light").unwrap();

    for (h, prio) in [(heavy, 10), (light, 1)] {
        let next = core.dispatch_next().unwrap();
        assert_eq!(next, h);
        core.begin_run(0, next);
        core.set_priority(h, prio);
        core.yield_now(h);
        core.end_run(0, h);
    }

    let heavy_runs = (0..(2 * AGING_INTERVAL))
        .filter(|_| cycle(&mut core) == heavy)
        .count();
    // Stride-like share: roughly one heavy run per ten light ones
    assert!((10..=30).contains(&heavy_runs), "{}", heavy_runs);
    assert_eq!(core.stats().snapshot().aging_overrides, 0);
}
