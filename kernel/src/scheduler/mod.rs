/*
 * Scheduler Entry Points
 *
 * Boot-time setup (`init`, `userinit`), the public surface demo and
 * syscall-handler code calls (`spawn`, `yield_now`, `exit_current`,
 * `change_sched` — re-exported from `policy`), and the timer routine that
 * drives preemption. Everything below this module's public functions is
 * an implementation detail: `api` is the only other submodule callers
 * outside `scheduler` should reach into (and then only for `wait`/`kill`,
 * which don't have a convenience wrapper here since they already take a
 * `ProcHandle`/`ProcessId` rather than "the current process").
 */

pub mod api;
pub mod context;
pub mod heap;
pub mod percpu;
pub mod policy;
pub mod process;
pub mod spinlock;
pub mod types;

use core::sync::atomic::Ordering;

use spin::Mutex;

pub use policy::change_sched;
use process::{alloc_proc, PROC_TABLE};
use types::{Algorithm, ProcHandle, ProcessState};

/// The first process ever created, and therefore every orphan's new
/// parent once its own parent exits. `None` until `userinit` runs.
pub static INIT_HANDLE: Mutex<Option<ProcHandle>> = Mutex::new(None);

/// One-time setup before any process exists. Currently a no-op beyond
/// what `lazy_static!`-initialized `PROC_TABLE`/`SCHED_POLICY` already
/// give us for free on first touch; kept as a named entry point so boot
/// code has one call to make regardless of what future submodule state
/// needs eager initialization.
pub fn init() {}

/// Create the init process and enqueue it the same way every other
/// process is enqueued: through `api::put`, never a direct poke of
/// `state = RUNNABLE`. `entry` loops forever reaping zombies reparented
/// to it, the same role xv6's `initproc` plays.
pub fn userinit(entry: extern "C" fn() -> !) -> ProcHandle {
    let h = alloc_proc("init", entry).expect("process table exhausted during userinit");
    *INIT_HANDLE.lock() = Some(h);
    api::put(h);
    h
}

/// Allocate and enqueue a new process. Thin wrapper over
/// `process::alloc_proc` + `api::put` for boot-time demo processes and
/// anything else that just needs "a runnable process exists now".
pub fn spawn(name: &str, entry: extern "C" fn() -> !) -> Option<ProcHandle> {
    let h = alloc_proc(name, entry)?;
    api::put(h);
    Some(h)
}

/// Voluntarily give up the CPU. A no-op if called with no current
/// process (e.g. from the idle path before any process has run).
pub fn yield_now() {
    if let Some(h) = percpu::current_handle() {
        api::yield_cpu(h);
    }
}

/// Terminate the calling process with `status`. Never returns.
///
/// # Panics
/// Panics if there is no current process — there is no sensible status
/// to exit with on behalf of nothing.
pub fn exit_current(status: i32) -> ! {
    let h = percpu::current_handle().expect("exit_current called with no current process");
    api::exit(h, status)
}

/// Hand control to the per-CPU scheduler loop. Never returns.
pub fn run() -> ! {
    percpu::scheduler_loop()
}

/// The timer interrupt routine: advance the running process's
/// `cpu_burst`, then decide whether this tick preempts it. Called from
/// the IRQ0 handler after `on_timer_interrupt()`'s bookkeeping, before
/// the EOI is sent — `yield_cpu` re-enables interrupts on the way back
/// through `scheduler_loop`'s `enable()` at the top of its next
/// iteration, not here.
pub fn timer_interrupt_handler() {
    let Some(h) = percpu::current_handle() else {
        return;
    };
    let slot = &PROC_TABLE[h];

    if slot.guarded.lock().state != ProcessState::Running {
        return;
    }

    let cpu_burst = slot.cpu_burst.fetch_add(1, Ordering::Relaxed) + 1;

    let (algorithm, is_preemptive) = {
        let policy = policy::SCHED_POLICY.lock();
        (policy.algorithm, policy.is_preemptive)
    };
    let timeslice = slot.timeslice.load(Ordering::Relaxed);

    let timeslice_expired = timeslice != 0 && cpu_burst == timeslice;
    let sjf_preempts_every_tick = algorithm == Algorithm::Sjf && is_preemptive;

    if timeslice_expired || sjf_preempts_every_tick {
        yield_now();
    }
}
