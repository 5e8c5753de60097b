/*
 * Context Switch Primitive
 *
 * `swtch` is the only place a kernel stack changes owner. It saves the
 * callee-saved registers of the outgoing context and restores them from
 * the incoming one, then returns into whatever the incoming context's
 * saved return address points at — which, for a process dispatched for
 * the first time, is `trampoline` rather than a real prior call site.
 *
 * Caller-saved registers need no attention here: by the time `swtch` is
 * reached, the System V calling convention has already spilled anything
 * the caller cared about, exactly as with any other function call.
 */

use core::arch::naked_asm;

/// Saved machine state for one stack. Field order matches the push/pop
/// sequence in `swtch` exactly — reordering one without the other is a
/// silent miscompile, not a type error, since the asm below addresses
/// fields by raw offset.
#[repr(C)]
#[derive(Debug, Default)]
pub struct Context {
    pub ra: u64,
    pub rsp: u64,
    pub rbx: u64,
    pub rbp: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
}

impl Context {
    pub const fn zeroed() -> Self {
        Context { ra: 0, rsp: 0, rbx: 0, rbp: 0, r12: 0, r13: 0, r14: 0, r15: 0 }
    }
}

/// Switch from `old` to `new`: save the current callee-saved registers
/// and stack pointer into `*old`, then load `*new`'s and jump to its
/// saved return address.
///
/// # Safety
/// Both pointers must reference live, correctly initialized `Context`
/// values for stacks that are not concurrently in use elsewhere. The
/// caller must hold exactly the locks the scheduler's suspension-point
/// discipline requires before calling this.
#[unsafe(naked)]
pub unsafe extern "C" fn swtch(old: *mut Context, new: *const Context) {
    naked_asm!(
        // rdi = old, rsi = new
        "lea rax, [rip + 2f]",
        "mov [rdi + 0x00], rax",
        "mov [rdi + 0x08], rsp",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",

        "mov rax, [rsi + 0x00]",
        "mov rsp, [rsi + 0x08]",
        "mov rbx, [rsi + 0x10]",
        "mov rbp, [rsi + 0x18]",
        "mov r12, [rsi + 0x20]",
        "mov r13, [rsi + 0x28]",
        "mov r14, [rsi + 0x30]",
        "mov r15, [rsi + 0x38]",
        "jmp rax",
        "2:",
        "ret",
    );
}

/// First instruction executed on a freshly allocated process's stack.
///
/// `swtch`'s restore half does not distinguish a brand-new stack from one
/// that previously called `swtch` itself — it just jumps to whatever `ra`
/// holds. For a new process, `ra` is set to this function. `swtch` does
/// not carry call arguments through for a fresh stack (none of the
/// registers it restores are argument registers), so the entry point is
/// looked up from the process table instead of being passed in.
///
/// Mirrors the per-CPU loop's own locking discipline: the scheduler loop
/// that dispatched this slot for the first time is holding `p.lock`
/// (logically — its `MutexGuard` is parked on the CPU's scheduler stack),
/// so the very first thing a new process does is release it, the same
/// way it releases its own lock on every subsequent return through
/// `yield_cpu`/`sleep`.
pub extern "C" fn trampoline() -> ! {
    let h = crate::scheduler::percpu::current_handle()
        .expect("trampoline entered with no current process");
    unsafe {
        crate::scheduler::process::PROC_TABLE[h].lock.release();
    }
    let entry = crate::scheduler::process::PROC_TABLE[h]
        .guarded
        .lock()
        .entry
        .expect("fresh process has no entry point");
    entry()
}
