//! The two trap entry points every IDT gate points at.
//!
//! Both trampolines save the general-purpose registers and call into Rust.
//! Their bodies are stubs: the generic path counts the event and returns
//! with `iretd`, the exception path reports it and halts.
//!
//! `interrupt_stub` assumes no error code on the stack. The CPU pushes one
//! for the vectors in [`ERROR_CODE_VECTORS`], and those at 16 and above land
//! on the generic gate, where `iretd` would pop the code as EIP. Interrupts
//! stay disabled until per-vector handlers exist.

/// Exception vectors for which the CPU pushes an error code.
pub const ERROR_CODE_VECTORS: [usize; 10] = [8, 10, 11, 12, 13, 14, 17, 21, 29, 30];

#[cfg(target_arch = "x86")]
use super::storage;

/// Linear addresses of the trampolines, as written into the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoints {
    /// Target of vectors `[vector_count / 16, vector_count)`.
    pub interrupt: u32,
    /// Target of vectors `[0, vector_count / 16)`.
    pub exception: u32,
}

#[cfg(target_arch = "x86")]
core::arch::global_asm!(
    ".section .text",
    ".global interrupt_stub",
    "interrupt_stub:",
    // no error code expected; see the module docs
    "pushad",
    "cld",
    "call {generic}",
    "popad",
    "iretd",
    ".global exception_stub",
    "exception_stub:",
    "pushad",
    "cld",
    "call {exception}",
    "2:",
    "cli",
    "hlt",
    "jmp 2b",
    generic = sym generic_interrupt,
    exception = sym unhandled_exception,
);

#[cfg(target_arch = "x86")]
extern "C" {
    fn interrupt_stub();
    fn exception_stub();
}

/// Addresses of the assembled trampolines.
#[cfg(target_arch = "x86")]
pub fn entry_points() -> EntryPoints {
    EntryPoints {
        interrupt: interrupt_stub as usize as u32,
        exception: exception_stub as usize as u32,
    }
}

#[cfg(target_arch = "x86")]
extern "C" fn generic_interrupt() {
    storage::record_interrupt();
}

#[cfg(target_arch = "x86")]
extern "C" fn unhandled_exception() -> ! {
    let n = storage::record_exception();
    log::error!("unhandled exception (#{n}); halting");
    crate::kernel::halt()
}
