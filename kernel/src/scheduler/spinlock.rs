/*
 * Raw Process Spinlock
 *
 * `proc.lock` cannot be a scope-based `spin::Mutex` guard: the per-CPU
 * loop acquires it, then `swtch`es into the process, and the process
 * itself is the one that eventually releases it — from a completely
 * different call frame, on the same stack but long after the guard's
 * lexical scope in the loop would have ended. A `MutexGuard` assumes its
 * `Drop` runs on the same path that created it; that assumption breaks
 * the moment a context switch is in between. So `proc.lock` is a manual
 * acquire/release pair instead, matching the standard xv6-style
 * "push/pop-off" discipline: every acquire disables interrupts on the
 * calling CPU and every release restores them once the nesting count
 * returns to zero.
 */

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::arch::x86_64::interrupts;

/// Per-CPU interrupt-disable nesting state. Only CPU 0 is ever live in
/// this build, but the struct already generalizes to `MAX_CPUS` so it
/// composes with `percpu::Cpu` once more cores are brought up.
pub struct PushOffState {
    depth: AtomicUsize,
    were_enabled: AtomicBool,
}

impl PushOffState {
    pub const fn new() -> Self {
        PushOffState { depth: AtomicUsize::new(0), were_enabled: AtomicBool::new(false) }
    }

    /// Disable interrupts, remembering the pre-existing state the first
    /// time this nests from zero.
    pub fn push_off(&self) {
        let was_enabled = interrupts::are_enabled();
        if was_enabled {
            interrupts::disable();
        }
        if self.depth.load(Ordering::Relaxed) == 0 {
            self.were_enabled.store(was_enabled, Ordering::Relaxed);
        }
        self.depth.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo one `push_off`. Interrupts are only actually re-enabled once
    /// the nesting count returns to zero and they were enabled before the
    /// outermost `push_off`.
    pub fn pop_off(&self) {
        let prev = self.depth.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "pop_off without matching push_off");
        if prev == 1 && self.were_enabled.load(Ordering::Relaxed) {
            interrupts::enable();
        }
    }

    /// The nesting depth of disabled-interrupt regions on this CPU.
    /// `sched()` requires this to be exactly one at the suspension point.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }
}

/// A non-reentrant spinlock whose release is not tied to Rust scoping.
///
/// Combined with `PushOffState`, `acquire`/`release` implement the same
/// protocol as `spin::Mutex` minus the RAII guard: callers are trusted to
/// release exactly once per acquire, which is what lets a process's own
/// first-run trampoline release a lock it never itself acquired.
pub struct RawSpinLock {
    locked: AtomicBool,
}

impl RawSpinLock {
    pub const fn new() -> Self {
        RawSpinLock { locked: AtomicBool::new(false) }
    }

    pub fn acquire(&self) {
        crate::scheduler::percpu::current_cpu().push_off.push_off();
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }

    /// Release the lock.
    ///
    /// # Safety
    /// Must only be called by whichever logical owner currently holds the
    /// lock — there is no compile-time proof of ownership, unlike a
    /// `MutexGuard`. Must be called on the same CPU that acquired it, since
    /// it pairs with that CPU's `push_off`.
    pub unsafe fn release(&self) {
        self.locked.store(false, Ordering::Release);
        crate::scheduler::percpu::current_cpu().push_off.pop_off();
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}
