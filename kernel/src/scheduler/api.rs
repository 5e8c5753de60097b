/*
 * State-Transition API
 *
 * `put`, `get`, `yield_cpu`, `sleep`, `wakeup`, `exit`, `wait` and `kill` —
 * the only sanctioned entry points that move a process between states and
 * touch the heap. Every operation here that mutates a process's fields
 * does so with that process's `lock` held (`ProcSlot::lock`, a
 * `RawSpinLock`, not a scoped guard — see `spinlock.rs` for why).
 *
 * One deliberate departure from a fully literal reading of the per-CPU
 * loop's "on return, re-enqueue via put" wording: if `yield_cpu` itself
 * performed the heap insertion (as `put` does for every other caller),
 * the loop's own re-enqueue step would insert the same handle a second
 * time the moment `yield_cpu`'s switch returns, leaving a duplicate
 * heap entry. `yield_cpu` therefore applies the statistics update and
 * the state transition to `RUNNABLE` — exactly what a reader would
 * recognize as "calling put" — and leaves the single heap insertion to
 * `percpu::scheduler_loop`, which is the only code that can observe
 * whether this was in fact the yield path (state already `RUNNABLE` on
 * return) versus anything else (`SLEEPING`/`ZOMBIE`, which it leaves
 * alone). See the design ledger for the full reasoning.
 */

use core::sync::atomic::Ordering;

use spin::{Mutex, MutexGuard};

use crate::scheduler::context::{swtch, Context};
use crate::scheduler::percpu;
use crate::scheduler::policy::{SchedulerPolicy, SCHED_POLICY};
use crate::scheduler::process::{find_by_pid, free_proc_locked, PROC_TABLE, NPROC, WAIT_LOCK};
use crate::scheduler::types::{ProcHandle, ProcessId, ProcessState};
use crate::scheduler::INIT_HANDLE;

pub fn global_ticks() -> u64 {
    crate::utils::timer::scheduler_ticks()
}

/// Statistics update plus the `RUNNABLE` transition, performed while
/// holding both `p.lock` (by the caller, already) and
/// `SchedulerPolicy.lock` (passed in). Does not touch the heap; callers
/// decide separately whether to insert.
fn mark_runnable_with_stats(h: ProcHandle, policy: &SchedulerPolicy) {
    let slot = &PROC_TABLE[h];
    let mut guard = slot.guarded.lock();

    let was_running = guard.state == ProcessState::Running;
    if !was_running {
        // Fresh enqueue, woken from sleep, or just allocated: fold the
        // last burst into the smoothed estimate and start a new
        // execution-time window.
        let cpu_burst = slot.cpu_burst.load(Ordering::Relaxed);
        let aprox = slot.cpu_burst_aprox.load(Ordering::Relaxed);
        // `policy.a` is only range-checked when SJF is the active
        // algorithm (`change_sched` skips the check for CFS, which never
        // reads it); clamp here too so a stale out-of-range value left
        // over from a CFS reconfiguration can never underflow `100 - a`.
        let a = (policy.a as u64).min(100);
        let updated = (a * cpu_burst + (100 - a) * aprox) / 100;
        slot.cpu_burst_aprox.store(updated, Ordering::Relaxed);
        slot.exe_time.store(0, Ordering::Relaxed);
    } else {
        // Voluntary yield without blocking: the burst isn't "done" yet,
        // just fold it into the running execution-time tally.
        let cpu_burst = slot.cpu_burst.load(Ordering::Relaxed);
        slot.exe_time.fetch_add(cpu_burst, Ordering::Relaxed);
    }
    slot.put_timestamp.store(global_ticks(), Ordering::Relaxed);
    guard.state = ProcessState::Runnable;
}

/// Enqueue `h` as `RUNNABLE`. Caller already holds `h`'s lock.
pub fn put_locked(h: ProcHandle) {
    let mut policy = SCHED_POLICY.lock();
    mark_runnable_with_stats(h, &policy);
    policy.insert(h);
}

/// Enqueue `h` as `RUNNABLE`, acquiring its lock first.
pub fn put(h: ProcHandle) {
    let slot = &PROC_TABLE[h];
    slot.lock.acquire();
    put_locked(h);
    unsafe {
        slot.lock.release();
    }
}

/// Dequeue the minimum-key `RUNNABLE` process, or `None` if the heap is
/// empty. Returned without its lock held — the caller reacquires it
/// before touching state.
pub fn get() -> Option<ProcHandle> {
    let mut policy = SCHED_POLICY.lock();
    let ret = policy.pop_min()?;
    PROC_TABLE[ret].cpu_burst.store(0, Ordering::Relaxed);
    if policy.algorithm == crate::scheduler::types::Algorithm::Cfs {
        let put_ts = PROC_TABLE[ret].put_timestamp.load(Ordering::Relaxed);
        let now = global_ticks();
        let denom = policy.heap_size() as u64 + 1;
        let slice = now.saturating_sub(put_ts) / denom;
        PROC_TABLE[ret].timeslice.store(slice.max(1), Ordering::Relaxed);
    }
    Some(ret)
}

/// Voluntary relinquishment: remains `RUNNABLE`, re-enters the heap with
/// its accumulated `cpu_burst` folded in (via `percpu::scheduler_loop`,
/// see the module note above).
pub fn yield_cpu(h: ProcHandle) {
    let slot = &PROC_TABLE[h];
    slot.lock.acquire();
    {
        let policy = SCHED_POLICY.lock();
        mark_runnable_with_stats(h, &policy);
    }
    let cpu = percpu::current_cpu();
    let proc_ctx: *mut Context = &mut slot.guarded.lock().context as *mut Context;
    unsafe {
        swtch(proc_ctx, &cpu.scheduler_context as *const Context);
    }
    // Resumes here once dispatched again.
    unsafe {
        slot.lock.release();
    }
}

/// Atomic release-and-block: `external_lock` is released only once `h`
/// has committed to `SLEEPING` on `chan`, so a `wakeup` issued any time
/// after that commit is never missed.
pub fn sleep<'a, T>(h: ProcHandle, chan: usize, external_lock: &'a Mutex<T>, external_guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    let slot = &PROC_TABLE[h];
    slot.lock.acquire();
    drop(external_guard);

    {
        let mut guard = slot.guarded.lock();
        guard.chan = chan;
        guard.state = ProcessState::Sleeping;
    }

    let cpu = percpu::current_cpu();
    let proc_ctx: *mut Context = &mut slot.guarded.lock().context as *mut Context;
    unsafe {
        swtch(proc_ctx, &cpu.scheduler_context as *const Context);
    }

    // Resumes here once woken: exe_time is reset on the next put, as the
    // invariant requires, not here.
    slot.guarded.lock().chan = 0;
    unsafe {
        slot.lock.release();
    }
    external_lock.lock()
}

/// Wake every sleeper on `chan` other than the caller.
pub fn wakeup(chan: usize) {
    let self_h = percpu::current_handle();
    for h in 0..NPROC {
        if Some(h) == self_h {
            continue;
        }
        let slot = &PROC_TABLE[h];
        slot.lock.acquire();
        let should_wake = {
            let guard = slot.guarded.lock();
            guard.state == ProcessState::Sleeping && guard.chan == chan
        };
        if should_wake {
            put_locked(h);
        }
        unsafe {
            slot.lock.release();
        }
    }
}

/// Terminate the calling process. Never returns.
pub fn exit(h: ProcHandle, status: i32) -> ! {
    let wait_guard = WAIT_LOCK.lock();

    let init_h = *INIT_HANDLE.lock();
    let mut reparented_any = false;
    for c in 0..NPROC {
        if c == h {
            continue;
        }
        let cslot = &PROC_TABLE[c];
        cslot.lock.acquire();
        let is_child = cslot.guarded.lock().parent == Some(h);
        if is_child {
            cslot.guarded.lock().parent = init_h;
            reparented_any = true;
        }
        unsafe {
            cslot.lock.release();
        }
    }

    // Wake whoever might be blocked in `wait()` before touching our own
    // lock: `wakeup` acquires other processes' `lock` (and, through
    // `put_locked`, `SchedulerPolicy.lock`), and this process's own lock
    // must never be held while taking another's.
    let parent = PROC_TABLE[h].guarded.lock().parent;
    if let Some(p) = parent {
        wakeup(p);
    }
    if reparented_any {
        if let Some(init) = init_h {
            if Some(init) != parent {
                wakeup(init);
            }
        }
    }

    let slot = &PROC_TABLE[h];
    slot.lock.acquire();
    {
        let mut guard = slot.guarded.lock();
        guard.xstate = status;
        guard.state = ProcessState::Zombie;
    }
    drop(wait_guard);

    let cpu = percpu::current_cpu();
    let proc_ctx: *mut Context = &mut slot.guarded.lock().context as *mut Context;
    unsafe {
        swtch(proc_ctx, &cpu.scheduler_context as *const Context);
    }
    unreachable!("exited process resumed");
}

/// Block until a child of `h` exits. Returns its pid, or `-1` if `h` has
/// no children (or has been killed).
pub fn wait(h: ProcHandle, out_status: Option<&mut i32>) -> i32 {
    let mut wait_guard = WAIT_LOCK.lock();
    let mut out_status = out_status;
    loop {
        let mut have_children = false;
        for c in 0..NPROC {
            let cslot = &PROC_TABLE[c];
            let is_child_zombie = {
                let guard = cslot.guarded.lock();
                guard.parent == Some(h)
            };
            if !is_child_zombie {
                continue;
            }
            have_children = true;
            cslot.lock.acquire();
            let (is_zombie, pid, xstate) = {
                let guard = cslot.guarded.lock();
                (guard.state == ProcessState::Zombie, guard.pid, guard.xstate)
            };
            if is_zombie {
                if let Some(out) = out_status.as_deref_mut() {
                    *out = xstate;
                }
                free_proc_locked(c);
                unsafe {
                    cslot.lock.release();
                }
                return pid.0 as i32;
            }
            unsafe {
                cslot.lock.release();
            }
        }

        let killed = PROC_TABLE[h].guarded.lock().killed;
        if !have_children || killed {
            return -1;
        }

        wait_guard = sleep(h, h, &WAIT_LOCK, wait_guard);
    }
}

/// Mark `pid` killed; if it is sleeping, force it `RUNNABLE` so it can
/// observe the flag at its next user-return boundary.
pub fn kill(pid: ProcessId) -> i32 {
    let Some(h) = find_by_pid(pid) else {
        return -1;
    };
    let slot = &PROC_TABLE[h];
    slot.lock.acquire();
    let was_sleeping = {
        let mut guard = slot.guarded.lock();
        guard.killed = true;
        guard.state == ProcessState::Sleeping
    };
    if was_sleeping {
        put_locked(h);
    }
    unsafe {
        slot.lock.release();
    }
    0
}
