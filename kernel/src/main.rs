/*
 * CLUU Microkernel Main Entry Point
 *
 * This is the main entry point for the CLUU microkernel, a bare-metal Rust kernel
 * designed to work with the BOOTBOOT bootloader protocol. It handles the critical
 * early boot process and kernel initialization.
 *
 * Why this is important:
 * - Provides the entry point that BOOTBOOT calls when loading the kernel
 * - Handles multi-core boot process (BSP vs AP core management)
 * - Sets up proper kernel stack before entering Rust code
 * - Implements panic handling for kernel-level errors
 * - Coordinates the overall kernel initialization sequence
 *
 * Key features:
 * - Multi-core aware boot process
 * - Proper stack management for kernel execution
 * - Integration with BOOTBOOT protocol
 * - Safe transition from assembly to Rust code
 * - A pluggable, runtime-reconfigurable process scheduler (see `scheduler`)
 */

#![no_std]
#![no_main]
#![feature(abi_x86_interrupt)]
#![feature(alloc_error_handler)]
#![allow(dead_code)]

extern crate alloc;

use core::panic::PanicInfo;

mod arch;
mod bootboot;
mod memory;
mod scheduler;
mod syscall;
mod tests;
mod utils;

#[repr(C, align(16))]
pub struct AlignedBspStack([u8; 64 * 1024]);

#[unsafe(no_mangle)]
pub static mut BSP_STACK: AlignedBspStack = AlignedBspStack([0; 64 * 1024]);

/// ===============================
///  EARLY ENTRY POINT (_start)
/// ===============================
///
/// Called directly by BOOTBOOT loader on ALL CORES.
/// Required to:
///   - Identify BSP using bootboot.bspid
///   - Switch to our own 64 KiB kernel stack
///   - Call into Rust's `kstart`
///   - Park APs
///
#[unsafe(naked)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _start() -> ! {
    core::arch::naked_asm!(
        // CPUID leaf 1 → EBX[31:24] = APIC ID
        "mov eax, 1",
        "cpuid",
        "shr ebx, 24",                 // EBX now holds core ID

        // Load &bootboot into RAX
        "lea rax, [rip + bootboot]",

        // Read bspid (u16 @ offset 0x0C)
        "movzx ecx, word ptr [rax + 0x0C]",

        // Compare APIC ID vs bspid
        "cmp ebx, ecx",
        "jne 2f",                      // If not BSP → jump to AP section

        // =======================
        //       BSP PATH
        // =======================

        // Switch to our 64 KiB BSP stack
        "lea rax, [rip + BSP_STACK]",
        "add rax, {stack_size}",
        "mov rsp, rax",

        // Jump into real Rust kernel entry
        "jmp kstart",

        // =======================
        //       AP PATH
        // =======================
        //
        // Only the BSP runs the scheduler in this build (its per-CPU
        // loop is started once, from `kstart`); APs just park.
        "2:",
        "1:",
        "hlt",
        "jmp 1b",

        stack_size = const 64 * 1024,
    );
}

/// One of the demo processes spawned after `userinit`, exercising SJF
/// ordering: computes for a while, yields, repeats. Its recorded bursts
/// differ across the three demo processes so a reader watching the log
/// can see SJF's ordering-by-last-burst in action.
extern "C" fn cpu_bound_demo() -> ! {
    loop {
        let mut acc: u64 = 0;
        for i in 0..2_000_000u64 {
            acc = acc.wrapping_add(i);
        }
        core::hint::black_box(acc);
        scheduler::yield_now();
    }
}

/// The init process: reaps zombies reparented to it when their
/// original parent exits, then yields. Never exits itself.
extern "C" fn init_main() -> ! {
    loop {
        scheduler::api::wait(
            scheduler::percpu::current_handle().expect("init_main has no current handle"),
            None,
        );
        scheduler::yield_now();
    }
}

/// ===============================
///  RUST KERNEL ENTRY POINT
/// ===============================
///
/// Now running on our safe, large BSP stack.
/// APs never run this function.
///
#[unsafe(no_mangle)]
pub extern "C" fn kstart() -> ! {
    // Step 1: Initialize debug infrastructure first
    utils::debug::init_debug_infrastructure();

    // Step 2: Initialize logging system
    utils::debug::logger::init(true);
    log::info!("CLUU Kernel starting...");

    // Step 3: Initialize GDT (Global Descriptor Table)
    arch::x86_64::gdt::init();

    // Step 3.5: Initialize IDT (Interrupt Descriptor Table)
    // CRITICAL: Must be initialized BEFORE memory management (CR3 switch)
    // If any exception/NMI occurs during CR3 switch and IDT isn't set up,
    // the CPU will triple fault
    arch::x86_64::idt::init();

    // Step 3.6: Initialize SYSCALL/SYSRET mechanism
    syscall::init();

    // Step 4: Initialize memory management
    memory::init();
    log::info!("Memory management initialized successfully");

    // Step 5: Initialize the scheduler and its init process
    scheduler::init();
    scheduler::userinit(init_main);
    log::info!("init process created and enqueued");

    // Step 6: Spawn a few demo processes so the policy in effect at boot
    // (SJF, non-preemptive) has something to choose between.
    for name in ["demo-a", "demo-b", "demo-c"] {
        match scheduler::spawn(name, cpu_bound_demo) {
            Some(_) => log::info!("spawned {}", name),
            None => log::error!("process table exhausted spawning {}", name),
        }
    }

    // Step 7: Run the scheduler self-tests before interrupts are enabled,
    // so they run serially against a quiescent process table.
    tests::run_all();

    // Step 8: Enable interrupts — the timer IRQ now drives preemption
    // through `scheduler::timer_interrupt_handler`.
    x86_64::instructions::interrupts::enable();
    log::info!("Interrupts enabled");

    log::info!("Kernel initialization complete, entering scheduler loop");
    scheduler::run()
}

///  PANIC HANDLER
/// ===============================
///
/// Logging may fail early, but this is safe once the logger is up.
///
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    x86_64::instructions::interrupts::disable();

    if let Some(location) = info.location() {
        log::error!(
            "PANIC at {}:{}: {}",
            location.file(),
            location.line(),
            info.message()
        );
    } else {
        log::error!("PANIC: {}", info.message());
    }

    loop {
        x86_64::instructions::hlt();
    }
}
