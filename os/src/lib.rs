//! Shard: earliest bring-up of a 32-bit x86 kernel.
//!
//! The library holds everything the boot path needs: the multiboot hand-off
//! validator, the descriptor entry codec, GDT/IDT construction and the console
//! collaborators. The `shard` binary only carries the multiboot header, the
//! `_start` trampoline and the panic handler.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod kernel;
pub mod logger;
pub mod multiboot;
pub mod port;
pub mod serial;
pub mod vga;

#[cfg(target_arch = "x86")]
pub mod arch;
