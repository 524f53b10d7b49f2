/*!
 * Dispatch Benchmarks
 *
 * Cost of one dispatch/yield cycle and of a live discipline switch, per
 * discipline and ready-queue depth
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kernel_sched::{Channel, Discipline, SchedCore, Scheduler, SchedulerConfig};

fn populated(discipline: Discipline, ready: usize) -> Scheduler {
    let sched = Scheduler::new(
        SchedulerConfig::default()
            .with_nproc(ready + 1)
            .with_cpus(1)
            .with_discipline(discipline),
    );
    {
        let mut core = sched.lock();
        let init = core.spawn_init("init").unwrap();
        let h = core.dispatch_next().unwrap();
        core.begin_run(0, h);
        core.sleep(h, Channel::Event(0));
        core.end_run(0, h);
        for i in 0..ready {
            core.fork(init, &format!("w{}", i)).unwrap();
        }
    }
    sched
}

fn cycle(core: &mut SchedCore) {
    let h = core.dispatch_next().unwrap();
    core.begin_run(0, h);
    core.yield_now(h);
    core.end_run(0, h);
}

fn bench_dispatch_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_cycle");

    for discipline in Discipline::ALL {
        for ready in [4usize, 32, 63] {
            let sched = populated(discipline, ready);
            group.bench_with_input(
                BenchmarkId::new(discipline.as_str(), ready),
                &ready,
                |b, _| {
                    let mut core = sched.lock();
                    b.iter(|| cycle(black_box(&mut core)));
                },
            );
        }
    }

    group.finish();
}

fn bench_discipline_switch(c: &mut Criterion) {
    let mut group = c.benchmark_group("discipline_switch");

    for ready in [4usize, 32, 63] {
        let sched = populated(Discipline::RoundRobin, ready);
        group.bench_with_input(BenchmarkId::from_parameter(ready), &ready, |b, _| {
            let mut core = sched.lock();
            b.iter(|| {
                core.set_discipline(Discipline::Priority);
                core.set_discipline(Discipline::RoundRobin);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch_cycle, bench_discipline_switch);
criterion_main!(benches);
