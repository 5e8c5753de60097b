/*
 * Memory Management
 *
 * This build carries no paging or physical-frame allocator: virtual
 * memory is an explicit non-goal of the scheduler this kernel exists
 * to exercise. The only memory service this build carries is the
 * kernel heap, backed by a fixed static region instead of a
 * paging-mapped one.
 */

pub mod heap;

/// Top-level memory initialization: just the kernel heap.
pub fn init() {
    log::info!("Initializing memory management...");
    heap::init();
}
