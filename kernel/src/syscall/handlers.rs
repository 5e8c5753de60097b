/*
 * System Call Handlers
 *
 * Each handler validates its arguments, performs the requested operation,
 * and returns a result or a negative error code. The process-control
 * handlers are thin wrappers over `scheduler::api`/`scheduler::change_sched`
 * — the syscall boundary's only job is translating raw register values
 * into the types those functions expect.
 */

use super::numbers::*;
use crate::scheduler;
use crate::scheduler::types::ProcessId;
use crate::utils::writer::Writer;
use core::fmt::Write as _;

/// Validate a user pointer
///
/// Checks that a pointer from userspace is:
/// - Not NULL
/// - Within userspace address range (< 0x0000_8000_0000_0000)
/// - Does not overflow when adding count
///
/// Returns Ok(()) if valid, Err(error_code) otherwise.
fn validate_user_ptr<T>(ptr: *const T, count: usize) -> Result<(), isize> {
    let addr = ptr as usize;

    if addr == 0 {
        return Err(-EFAULT);
    }
    if addr >= 0x0000_8000_0000_0000 {
        return Err(-EFAULT);
    }
    if addr.checked_add(count * core::mem::size_of::<T>()).is_none() {
        return Err(-EFAULT);
    }

    Ok(())
}

/// Write `count` bytes from `buf` to the console. `fd` is accepted but
/// ignored — there is only one console, so any value behaves like stdout.
pub fn sys_write(_fd: i32, buf: *const u8, count: usize) -> isize {
    if let Err(e) = validate_user_ptr(buf, count) {
        return e;
    }
    let bytes = unsafe { core::slice::from_raw_parts(buf, count) };
    let mut writer = Writer::new();
    for &b in bytes {
        writer.write(b);
    }
    count as isize
}

pub fn sys_exit(status: i32) -> ! {
    scheduler::exit_current(status)
}

pub fn sys_yield() -> isize {
    scheduler::yield_now();
    0
}

/// Block until a child of the calling process exits.
pub fn sys_wait() -> isize {
    let Some(h) = scheduler::percpu::current_handle() else {
        return -1;
    };
    scheduler::api::wait(h, None) as isize
}

pub fn sys_kill(pid: i32) -> isize {
    if pid < 0 {
        return -1;
    }
    scheduler::api::kill(ProcessId(pid as usize)) as isize
}

pub fn sys_chsched(algorithm: i32, is_preemptive: i32, a: i32) -> isize {
    scheduler::change_sched(algorithm, is_preemptive, a) as isize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_user_ptr_rejects_null() {
        let p: *const u8 = core::ptr::null();
        assert_eq!(validate_user_ptr(p, 1), Err(-EFAULT));
    }

    #[test]
    fn validate_user_ptr_rejects_kernel_half() {
        let p = 0xFFFF_8000_0000_0000u64 as *const u8;
        assert_eq!(validate_user_ptr(p, 1), Err(-EFAULT));
    }

    #[test]
    fn validate_user_ptr_accepts_low_address() {
        let p = 0x1000u64 as *const u8;
        assert_eq!(validate_user_ptr(p, 16), Ok(()));
    }
}
