/*!
 * Kernel Scheduler - Demo Entry Point
 *
 * Boots the configured CPUs, runs an init process that forks a mix of
 * CPU-bound and sleeping workers, switches discipline mid-run and reports
 * per-child accounting plus scheduler statistics.
 */

use anyhow::{Context, Result};
use kernel_sched::monitoring::span_operation;
use kernel_sched::{
    from_fn, init_tracing, Discipline, ProcessContext, ProgramExecutor, Scheduler,
    SchedulerConfig, Syscall, SyscallResult, WaitOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const WORKERS: usize = 6;
const WORK_ROUNDS: u32 = 200;

fn main() -> Result<()> {
    init_tracing();

    info!("Kernel scheduler starting...");
    let config = SchedulerConfig::from_env();
    info!(
        discipline = %config.discipline,
        cpus = config.cpus,
        nproc = config.nproc,
        "Configuration loaded"
    );

    let scheduler = Arc::new(Scheduler::new(config));
    let executor = Arc::new(ProgramExecutor::new());
    let finished = Arc::new(AtomicBool::new(false));

    executor
        .spawn_init(&scheduler, "init", init_program(Arc::clone(&finished)))
        .context("Failed to create init process")?;

    let cpus = scheduler
        .boot(Arc::clone(&executor))
        .context("Failed to start CPU threads")?;
    info!("{} CPUs running", cpus.len());

    // Timer interrupts and a mid-run discipline change
    let mut ticks = 0u64;
    while !finished.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(1));
        ticks = scheduler.clock_tick();
        if ticks == 20 {
            let _op = span_operation("demo_switch");
            scheduler.set_discipline(Discipline::ExtendedPriority);
        }
        if ticks > 10_000 {
            warn!("Workload did not finish; halting early");
            break;
        }
    }

    scheduler.halt();
    for cpu in cpus {
        if cpu.join().is_err() {
            warn!("A CPU thread panicked");
        }
    }

    let stats = scheduler.stats();
    info!(ticks, "Scheduler halted");
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&scheduler.snapshot())
            .context("Failed to serialize process listing")?
    );
    Ok(())
}

/// Init: fork the workers, reap them all with accounting, then idle
fn init_program(finished: Arc<AtomicBool>) -> impl kernel_sched::Program {
    let mut forked = false;
    let mut reaped = 0;

    from_fn(move |ctx| {
        if !forked {
            forked = true;
            for i in 0..WORKERS {
                let name = format!("worker{}", i);
                let program = if i % 2 == 0 {
                    cpu_bound(i)
                } else {
                    sleeper(i)
                };
                if let Err(e) = ctx.fork(&name, program) {
                    warn!(error = %e, "fork failed");
                }
            }
        }

        match ctx.syscall(Syscall::WaitStat) {
            SyscallResult::Success {
                value,
                exit_status,
                perf,
            } => {
                reaped += 1;
                info!(pid = value, ?exit_status, ?perf, "Reaped worker");
                ctx.yield_now();
            }
            SyscallResult::Blocked => {}
            SyscallResult::Error { message } => {
                info!(reaped, %message, "No children left");
                finished.store(true, Ordering::Release);
                ctx.sleep_on(kernel_sched::Channel::Event(u64::MAX));
            }
        }
    })
}

/// Compute for a while at an index-dependent priority, then exit
fn cpu_bound(index: usize) -> Box<dyn kernel_sched::Program> {
    let mut rounds = 0u32;
    let priority = (index % 10 + 1) as i32;

    Box::new(from_fn(move |ctx: &mut ProcessContext<'_, '_>| {
        if rounds == 0 {
            ctx.set_priority(priority);
        }
        rounds += 1;
        let sum = ctx.compute(|| (0..10_000u64).fold(0u64, |acc, x| acc.wrapping_add(x * x)));
        if rounds >= WORK_ROUNDS {
            ctx.exit((sum % 128) as i32);
        }
    }))
}

/// Alternate between short computations and timer sleeps, then exit
fn sleeper(index: usize) -> Box<dyn kernel_sched::Program> {
    let mut naps = 0u32;
    let mut deadline = None;

    Box::new(from_fn(move |ctx: &mut ProcessContext<'_, '_>| {
        let until = *deadline.get_or_insert_with(|| ctx.uptime() + 2);
        match ctx.sleep_until(until) {
            Ok(WaitOutcome::Blocked) => {}
            Ok(WaitOutcome::Ready(())) => {
                deadline = None;
                naps += 1;
                if naps >= 5 {
                    ctx.exit(index as i32);
                } else {
                    ctx.yield_now();
                }
            }
            Err(_) => ctx.exit(-1),
        }
    }))
}
