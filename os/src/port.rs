//! Legacy port I/O primitives.

/// Write byte to port
///
/// # Safety
/// Writing to an I/O port can have arbitrary side effects on the device behind it.
#[inline(always)]
pub unsafe fn outb(port: u16, value: u8) {
    core::arch::asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack, preserves_flags));
}

/// Read byte from port
///
/// # Safety
/// Reading some ports acknowledges device state; the caller must own the device.
#[inline(always)]
pub unsafe fn inb(port: u16) -> u8 {
    let value: u8;
    core::arch::asm!("in al, dx", in("dx") port, out("al") value, options(nomem, nostack, preserves_flags));
    value
}
