/*
 * System Call Numbers
 *
 * This module defines the syscall numbers following the System V AMD64 ABI
 * convention used by Linux and most Unix-like systems.
 *
 * Syscall Mechanism:
 * - RAX register contains syscall number
 * - Arguments in RDI, RSI, RDX, R10, R8, R9 (6 args max)
 * - Return value in RAX (signed: negative = error code)
 *
 * The surface here is deliberately narrow: console output (so a userspace
 * CLI can print something) plus exactly the process-control operations the
 * scheduler exposes. File descriptors, heap management, and every other
 * concern a full libc expects are out of scope — this kernel has no
 * filesystem or user-mode heap to back them.
 */

/// Syscall error codes (negative values returned in RAX)
pub const ENOSYS: isize = 38;   // Function not implemented
pub const EFAULT: isize = 14;   // Bad address (invalid pointer from userspace)

/// Write to the console (COM2 serial port). The only I/O syscall kept:
/// userspace tools like `chsched` need some way to report what happened.
///
/// Arguments: (fd: i32, buf: *const u8, count: usize) -> isize
/// Returns: number of bytes written, or negative error code
pub const SYS_WRITE: usize = 1;

/// Process control syscalls

/// Exit current process
///
/// Arguments: (status: i32) -> !
/// Does not return
pub const SYS_EXIT: usize = 60;

/// Yield CPU to scheduler
///
/// Arguments: () -> isize
/// Returns: 0 on success
pub const SYS_YIELD: usize = 158; // sched_yield in Linux

/// Block until a child exits.
///
/// Arguments: () -> isize
/// Returns: pid of the reaped child, or -1 if the caller has none
pub const SYS_WAIT: usize = 61; // wait4 in Linux

/// Mark a process killed.
///
/// Arguments: (pid: i32) -> isize
/// Returns: 0 on success, -1 if no such process
pub const SYS_KILL: usize = 62;

/// Reconfigure the scheduler's dispatch policy at runtime.
///
/// Arguments: (algorithm: i32, is_preemptive: i32, a: i32) -> isize
/// Returns: 0 on success, -2/-3 on validation failure
pub const SYS_CHSCHED: usize = 500; // CLUU-specific, above the Linux range
