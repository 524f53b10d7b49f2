/*!
 * Multiprocessor Tests
 * Real CPU threads running programs through the executor
 */

use super::common::scheduler;
use kernel_sched::{
    from_fn, Channel, Discipline, Exited, Perf, Pid, ProcessContext, Program, ProgramExecutor,
    WaitOutcome,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WORKERS: usize = 12;

fn worker(index: usize, rounds: u32) -> Box<dyn Program> {
    let mut done = 0;
    Box::new(from_fn(move |ctx: &mut ProcessContext<'_, '_>| {
        if done == 0 {
            ctx.set_priority((index % 10) as i32 + 1);
        }
        done += 1;
        ctx.compute(|| thread::yield_now());
        if done >= rounds {
            ctx.exit(index as i32);
        } else {
            ctx.yield_now();
        }
    }))
}

type Reaped = Arc<Mutex<Vec<(Exited, Perf)>>>;

fn reaper(reaped: Reaped, finished: Arc<AtomicBool>) -> impl Program {
    let mut forked = false;
    let mut rng = StdRng::seed_from_u64(0x5eed);
    from_fn(move |ctx| {
        if !forked {
            forked = true;
            for i in 0..WORKERS {
                let rounds = rng.gen_range(5..40);
                ctx.fork(&format!("w{}", i), worker(i, rounds)).unwrap();
            }
        }
        match ctx.wait_stat() {
            Ok(WaitOutcome::Ready(entry)) => {
                reaped.lock().push(entry);
                ctx.yield_now();
            }
            Ok(WaitOutcome::Blocked) => {}
            Err(_) => {
                finished.store(true, Ordering::Release);
                ctx.sleep_on(Channel::Event(0));
            }
        }
    })
}

fn wait_for(flag: &AtomicBool) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !flag.load(Ordering::Acquire) {
        assert!(Instant::now() < deadline, "workload timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_every_child_reaped_exactly_once() {
    for discipline in Discipline::ALL {
        let sched = Arc::new(scheduler(discipline, 4));
        let exec = Arc::new(ProgramExecutor::new());
        let reaped: Reaped = Arc::new(Mutex::new(Vec::new()));
        let finished = Arc::new(AtomicBool::new(false));

        exec.spawn_init(
            &sched,
            "init",
            reaper(Arc::clone(&reaped), Arc::clone(&finished)),
        )
        .unwrap();
        let cpus = sched.boot(Arc::clone(&exec)).unwrap();
        wait_for(&finished);
        sched.halt();
        for cpu in cpus {
            cpu.join().unwrap();
        }

        let reaped = reaped.lock();
        assert_eq!(reaped.len(), WORKERS);
        let pids: HashSet<Pid> = reaped.iter().map(|(e, _)| e.pid).collect();
        assert_eq!(pids.len(), WORKERS);
        let statuses: HashSet<i32> = reaped.iter().map(|(e, _)| e.status).collect();
        assert_eq!(statuses, (0..WORKERS as i32).collect::<HashSet<_>>());
        for (_, perf) in reaped.iter() {
            assert!(perf.ttime >= perf.ctime);
        }

        let core = sched.lock();
        core.verify();
        // Only init is left
        assert_eq!(core.snapshot().len(), 1);
        assert_eq!(exec.len(), 1);
    }
}

#[test]
fn test_switching_discipline_under_load() {
    let sched = Arc::new(scheduler(Discipline::RoundRobin, 3));
    let exec = Arc::new(ProgramExecutor::new());
    let reaped: Reaped = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(AtomicBool::new(false));

    exec.spawn_init(
        &sched,
        "init",
        reaper(Arc::clone(&reaped), Arc::clone(&finished)),
    )
    .unwrap();
    let cpus = sched.boot(Arc::clone(&exec)).unwrap();

    let mut id = 0;
    while !finished.load(Ordering::Acquire) {
        id = (id + 1) % 3;
        sched.set_discipline_id(id);
        sched.clock_tick();
        thread::sleep(Duration::from_micros(200));
    }
    sched.halt();
    for cpu in cpus {
        cpu.join().unwrap();
    }

    assert_eq!(reaped.lock().len(), WORKERS);
    sched.lock().verify();
    assert!(sched.stats().discipline_switches >= 1);
}

#[test]
fn test_kill_wakes_timer_sleeper() {
    let sched = Arc::new(scheduler(Discipline::Priority, 2));
    let exec = Arc::new(ProgramExecutor::new());
    let finished = Arc::new(AtomicBool::new(false));
    let reaped: Reaped = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reaped);
    let done = Arc::clone(&finished);
    let mut forked = false;

    exec.spawn_init(
        &sched,
        "init",
        from_fn(move |ctx| {
            if !forked {
                forked = true;
                ctx.fork(
                    "napper",
                    from_fn(|ctx: &mut ProcessContext<'_, '_>| match ctx.sleep_until(u64::MAX) {
                        Ok(WaitOutcome::Blocked) => {}
                        Ok(WaitOutcome::Ready(())) => ctx.exit(0),
                        Err(_) => ctx.exit(-9),
                    }),
                )
                .unwrap();
            }
            match ctx.wait_stat() {
                Ok(WaitOutcome::Ready(entry)) => {
                    sink.lock().push(entry);
                    done.store(true, Ordering::Release);
                    ctx.sleep_on(Channel::Event(0));
                }
                Ok(WaitOutcome::Blocked) => {}
                Err(e) => panic!("unexpected {}", e),
            }
        }),
    )
    .unwrap();
    let cpus = sched.boot(Arc::clone(&exec)).unwrap();

    // Wait until the napper is asleep, then kill it
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let asleep = sched
            .info(2)
            .map(|p| p.state == kernel_sched::ProcessState::Sleeping)
            .unwrap_or(false);
        if asleep {
            break;
        }
        assert!(Instant::now() < deadline, "napper never slept");
        thread::sleep(Duration::from_millis(1));
    }
    sched.kill(2).unwrap();

    wait_for(&finished);
    sched.halt();
    for cpu in cpus {
        cpu.join().unwrap();
    }

    let reaped = reaped.lock();
    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].0, Exited { pid: 2, status: -9 });
}
