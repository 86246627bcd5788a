//! Global storage for the IDT and trap counters

use core::sync::atomic::{AtomicU32, Ordering};
use spin::Once;

use super::Idt;

// === Trap counters ===
pub static INTERRUPT_COUNT: AtomicU32 = AtomicU32::new(0);
pub static EXCEPTION_COUNT: AtomicU32 = AtomicU32::new(0);

// === Global IDT Storage ===
// Built once by `idt::init` and never moved afterwards.
pub static IDT: Once<Idt> = Once::new();

/// Count one pass through the generic interrupt trampoline.
pub fn record_interrupt() -> u32 {
    INTERRUPT_COUNT.fetch_add(1, Ordering::Relaxed) + 1
}

/// Count one pass through the exception trampoline.
pub fn record_exception() -> u32 {
    EXCEPTION_COUNT.fetch_add(1, Ordering::Relaxed) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = INTERRUPT_COUNT.load(Ordering::Relaxed);
        let n = record_interrupt();
        assert!(n > before);
        assert!(record_interrupt() > n);

        let e = record_exception();
        assert!(EXCEPTION_COUNT.load(Ordering::Relaxed) >= e);
    }
}
