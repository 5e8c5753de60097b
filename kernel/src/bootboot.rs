/*
 * BOOTBOOT Protocol Structures
 *
 * Minimal bindings for the BOOTBOOT boot information block. The loader
 * places this structure at a fixed virtual address before jumping to
 * `_start`; we only read the handful of fields `_start` and the early
 * peripheral bring-up actually touch (BSP id, framebuffer geometry is
 * not used here since this build carries no framebuffer driver).
 *
 * See https://gitlab.com/bztsrc/bootboot for the full specification;
 * this is the subset the scheduler-focused build depends on.
 */

#[repr(C)]
pub struct BOOTBOOT {
    pub magic: [u8; 4],
    pub size: u32,
    pub protocol: u8,
    pub fb_type: u8,
    pub numcores: u16,
    pub bspid: u16,
    pub timezone: i16,
    pub datetime: [u8; 8],
    pub initrd_ptr: u64,
    pub initrd_size: u64,
    pub fb_ptr: u64,
    pub fb_size: u32,
    pub fb_width: u32,
    pub fb_height: u32,
    pub fb_scanline: u32,
    pub arch: [u64; 4],
}

unsafe extern "C" {
    /// Linker-placed BOOTBOOT info structure (mapped at a fixed virtual
    /// address by the loader, referenced by `_start`'s CPUID/bspid check).
    pub static bootboot: BOOTBOOT;
    /// Linker-placed framebuffer base; unused without a framebuffer driver,
    /// kept so any future display bring-up has the symbol available.
    pub static fb: u32;
}
