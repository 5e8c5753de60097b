/*
 * Per-CPU Scheduler State and Loop
 *
 * One `Cpu` record per logical core: which process (if any) it is
 * currently running, the context swtch returns to when that process
 * gives up the CPU, and the push/pop-off nesting depth backing its
 * `proc.lock` acquisitions.
 *
 * Only the bootstrap processor is actually brought up by this build —
 * `_start` parks every other core in a `hlt` loop before Rust code ever
 * runs — so `current_cpu` always resolves to index 0. The array is sized
 * to `MAX_CPUS` anyway so bringing up the remaining cores later is a
 * matter of starting their scheduler loops, not restructuring this file.
 */

use crate::scheduler::context::{swtch, Context};
use crate::scheduler::spinlock::PushOffState;
use crate::scheduler::types::{CpuId, ProcHandle, ProcessState};
use crate::scheduler::{api, process};

pub const MAX_CPUS: usize = 4;

pub struct Cpu {
    pub id: CpuId,
    pub current: Option<ProcHandle>,
    pub scheduler_context: Context,
    pub push_off: PushOffState,
}

impl Cpu {
    const fn new(id: u32) -> Self {
        Cpu {
            id: CpuId(id),
            current: None,
            scheduler_context: Context::zeroed(),
            push_off: PushOffState::new(),
        }
    }
}

static mut CPUS: [Cpu; MAX_CPUS] = [Cpu::new(0), Cpu::new(1), Cpu::new(2), Cpu::new(3)];

/// TODO: derive this from the local APIC ID once APs are actually started;
/// today only CPU 0 runs, so this is the only value that can be correct.
pub fn current_cpu_id() -> CpuId {
    CpuId::BSP
}

/// # Safety
/// Aliases the global per-CPU array without synchronization. Sound today
/// because only the BSP calls this; revisit once APs run their own loops.
#[allow(static_mut_refs)]
pub fn current_cpu() -> &'static mut Cpu {
    unsafe { &mut CPUS[current_cpu_id().as_usize()] }
}

pub fn current_handle() -> Option<ProcHandle> {
    current_cpu().current
}

/// The bootstrap processor's scheduler event loop. Never returns.
pub fn scheduler_loop() -> ! {
    loop {
        crate::arch::x86_64::interrupts::enable();

        let Some(h) = api::get() else {
            // Nothing runnable: halt until the next interrupt (timer or
            // device) rather than spin: an idle-thread-style halt rather
            // than a real zero-priority process in the table.
            x86_64::instructions::hlt();
            continue;
        };

        let slot = &process::PROC_TABLE[h];
        slot.lock.acquire();
        let runnable = slot.guarded.lock().state == ProcessState::Runnable;
        if runnable {
            {
                let mut guard = slot.guarded.lock();
                guard.state = ProcessState::Running;
            }
            let cpu = current_cpu();
            cpu.current = Some(h);

            let proc_ctx: *mut Context = {
                let mut guard = slot.guarded.lock();
                &mut guard.context as *mut Context
            };
            unsafe {
                swtch(&mut cpu.scheduler_context as *mut Context, proc_ctx);
            }

            let cpu = current_cpu();
            if cpu.current.is_some() {
                let still_runnable = slot.guarded.lock().state == ProcessState::Runnable;
                if still_runnable {
                    api::put_locked(h);
                }
            }
            cpu.current = None;
        }
        unsafe {
            slot.lock.release();
        }
    }
}
