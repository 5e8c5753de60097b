/*
 * Architecture Support Module
 *
 * This module contains all architecture-specific code for the CLUU
 * kernel. It provides the low-level architecture support needed for
 * proper kernel operation.
 *
 * Why this is important:
 * - Encapsulates all architecture-specific functionality
 * - Provides clean separation between generic kernel code and
 *   architecture specifics
 * - Enables potential porting to other architectures in the future
 *
 * Submodules:
 * - x86_64: GDT/IDT/interrupt control/peripheral bring-up
 */

#[cfg(target_arch = "x86_64")]
#[macro_use]
pub mod x86_64;
