/*
 * Kernel Heap Allocator
 *
 * Dynamic memory allocation for the kernel, built on the
 * `linked_list_allocator` crate. Rather than a paging-mapped virtual
 * region, this build has no paging (non-goal), so the heap is instead
 * backed by a fixed static byte array living in `.bss`.
 *
 * Supports the standard Rust allocation APIs (Box, Vec, etc.) the
 * process table and scheduler heap are built on.
 */

use linked_list_allocator::LockedHeap;

/// Size of the kernel heap in bytes (4 MiB). Large enough for the
/// process table, per-process kernel stacks and the scheduler's
/// priority-queue `Vec`.
pub const HEAP_SIZE: usize = 4 * 1024 * 1024;

/// Static backing storage for the heap. `static mut` because
/// `LockedHeap::init` needs a mutable pointer to hand to the
/// allocator; accessed exactly once, from `init()`.
static mut HEAP_MEMORY: [u8; HEAP_SIZE] = [0; HEAP_SIZE];

/// Global allocator instance used by Rust's allocation APIs.
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Initialize the kernel heap. Must be called exactly once during
/// kernel initialization, before any other module allocates.
pub fn init() {
    log::info!("Initializing kernel heap ({} KiB)...", HEAP_SIZE / 1024);

    unsafe {
        let start = core::ptr::addr_of_mut!(HEAP_MEMORY) as *mut u8;
        ALLOCATOR.lock().init(start, HEAP_SIZE);
    }

    log::info!("Kernel heap initialized successfully");
}

/// Allocation error handler (required when using a global allocator in no_std).
/// Allocation failure in a kernel has no sane recovery path.
#[alloc_error_handler]
fn alloc_error(layout: core::alloc::Layout) -> ! {
    panic!("Kernel heap allocation failed: {:?}", layout);
}
