/*
 * Process Table and Process Control Block
 *
 * The process table is the single owner of every `Process`; the heap in
 * `policy` only ever stores `ProcHandle` aliases into it. Fields the
 * scheduler's hot paths touch while holding nothing but
 * `SchedulerPolicy.lock` (`cpu_burst`, `cpu_burst_aprox`, `exe_time`,
 * `put_timestamp`, `timeslice`) live as plain atomics directly on the
 * slot so the heap's key function never has to reach for a second
 * process's `proc.lock` while the scheduler lock is already held —
 * exactly the lock-order restriction the concurrency model forbids.
 * Everything else sits behind `guarded`, mutated only while the slot's
 * `lock` (a `RawSpinLock`, not a scoped guard — see `spinlock.rs`) is
 * held.
 */

use alloc::boxed::Box;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use heapless::String;
use lazy_static::lazy_static;
use spin::Mutex;

use crate::scheduler::context::Context;
use crate::scheduler::spinlock::RawSpinLock;
use crate::scheduler::types::{ProcHandle, ProcessId, ProcessState};

/// Number of process table slots. Same order of magnitude as xv6's NPROC;
/// this build never comes close to exhausting it since only a handful of
/// processes exist for the self-test harness.
pub const NPROC: usize = 64;

const KSTACK_SIZE: usize = 16 * 1024;

/// Fields mutated only while `ProcSlot::lock` is held.
pub struct ProcGuarded {
    pub state: ProcessState,
    pub chan: usize,
    pub killed: bool,
    pub xstate: i32,
    pub pid: ProcessId,
    pub parent: Option<ProcHandle>,
    pub name: String<16>,
    pub context: Context,
    /// Kept alive for the process's lifetime so `context.rsp` always
    /// points into live memory; freed (by dropping) when the slot is
    /// reclaimed in `free_proc`.
    pub kstack: Option<Box<[u8]>>,
    pub entry: Option<extern "C" fn() -> !>,
}

impl ProcGuarded {
    const fn new() -> Self {
        ProcGuarded {
            state: ProcessState::Unused,
            chan: 0,
            killed: false,
            xstate: 0,
            pid: ProcessId(0),
            parent: None,
            name: String::new(),
            context: Context::zeroed(),
            kstack: None,
            entry: None,
        }
    }
}

pub struct ProcSlot {
    pub lock: RawSpinLock,
    pub guarded: Mutex<ProcGuarded>,
    pub cpu_burst: AtomicU64,
    pub cpu_burst_aprox: AtomicU64,
    pub exe_time: AtomicU64,
    pub put_timestamp: AtomicU64,
    pub timeslice: AtomicU64,
}

impl ProcSlot {
    fn new() -> Self {
        ProcSlot {
            lock: RawSpinLock::new(),
            guarded: Mutex::new(ProcGuarded::new()),
            cpu_burst: AtomicU64::new(0),
            cpu_burst_aprox: AtomicU64::new(0),
            exe_time: AtomicU64::new(0),
            put_timestamp: AtomicU64::new(0),
            timeslice: AtomicU64::new(0),
        }
    }
}

lazy_static! {
    pub static ref PROC_TABLE: alloc::vec::Vec<ProcSlot> =
        (0..NPROC).map(|_| ProcSlot::new()).collect();
}

/// Protects parent/child relationships, acquired before any `proc.lock`
/// when both are needed.
pub static WAIT_LOCK: Mutex<()> = Mutex::new(());

static NEXT_PID: AtomicUsize = AtomicUsize::new(1);

/// A monotonically increasing counter behind an atomic fetch-add gives
/// the same mutual-exclusion guarantee `pid_lock` asks for without a
/// dedicated lock object to acquire and release around a single integer.
fn alloc_pid() -> ProcessId {
    ProcessId(NEXT_PID.fetch_add(1, Ordering::Relaxed))
}

/// Find a free slot, assign it a pid and kernel stack, and leave it in
/// `USED` state with scheduling statistics reset. Returns `None` if the
/// table is full — resource exhaustion is reported up, never a panic.
pub fn alloc_proc(name: &str, entry: extern "C" fn() -> !) -> Option<ProcHandle> {
    for h in 0..NPROC {
        let slot = &PROC_TABLE[h];
        slot.lock.acquire();
        let mut guard = slot.guarded.lock();
        if guard.state == ProcessState::Unused {
            let pid = alloc_pid();
            let mut kstack = alloc::vec![0u8; KSTACK_SIZE].into_boxed_slice();
            let top = kstack.as_mut_ptr() as u64 + KSTACK_SIZE as u64;

            guard.pid = pid;
            guard.parent = None;
            guard.chan = 0;
            guard.killed = false;
            guard.xstate = 0;
            guard.name = String::try_from(name).unwrap_or_default();
            guard.entry = Some(entry);
            guard.context = Context::zeroed();
            guard.context.ra = crate::scheduler::context::trampoline as u64;
            guard.context.rsp = top;
            guard.kstack = Some(kstack);
            guard.state = ProcessState::Used;

            drop(guard);
            PROC_TABLE[h].cpu_burst.store(0, Ordering::Relaxed);
            PROC_TABLE[h].cpu_burst_aprox.store(0, Ordering::Relaxed);
            PROC_TABLE[h].exe_time.store(0, Ordering::Relaxed);
            PROC_TABLE[h].put_timestamp.store(0, Ordering::Relaxed);
            PROC_TABLE[h].timeslice.store(0, Ordering::Relaxed);
            unsafe {
                slot.lock.release();
            }
            return Some(h);
        }
        drop(guard);
        unsafe {
            slot.lock.release();
        }
    }
    None
}

/// Reclaim a `ZOMBIE` slot after its exit status has been collected.
/// Caller must hold `slot.lock`.
pub fn free_proc_locked(h: ProcHandle) {
    let slot = &PROC_TABLE[h];
    let mut guard = slot.guarded.lock();
    guard.kstack = None;
    guard.entry = None;
    guard.parent = None;
    guard.chan = 0;
    guard.killed = false;
    guard.xstate = 0;
    guard.name = String::new();
    guard.state = ProcessState::Unused;
}

pub fn find_by_pid(pid: ProcessId) -> Option<ProcHandle> {
    for h in 0..NPROC {
        let slot = &PROC_TABLE[h];
        let guard = slot.guarded.lock();
        if guard.state != ProcessState::Unused && guard.pid == pid {
            return Some(h);
        }
    }
    None
}
