//! Serial port (COM1 @ 0x3F8) mirror of the console, for `-serial stdio` debugging.

use crate::port::{inb, outb};

const COM1: u16 = 0x3F8;

const IER_OFF: u16 = 1;
const LCR_OFF: u16 = 3;
const LCR_DLAB: u8 = 0x80;
const LCR_8N1: u8 = 0x03;
const MCR_OFF: u16 = 4;
const MCR_DTR_RTS: u8 = 0x03;
const LSR_OFF: u16 = 5;
const LSR_THRE: u8 = 0x20;

/// 115200 / 3 = 38400 baud.
const BAUD_DIVISOR: u16 = 3;

/// Initialize COM1 (38400 8n1, no interrupts). Safe to call once at boot.
pub fn init() {
    unsafe {
        outb(COM1 + IER_OFF, 0x00);
        outb(COM1 + LCR_OFF, LCR_DLAB);
        outb(COM1, (BAUD_DIVISOR & 0xFF) as u8);
        outb(COM1 + IER_OFF, (BAUD_DIVISOR >> 8) as u8);
        outb(COM1 + LCR_OFF, LCR_8N1);
        outb(COM1 + MCR_OFF, MCR_DTR_RTS);
    }
}

fn is_transmit_empty() -> bool {
    unsafe { (inb(COM1 + LSR_OFF) & LSR_THRE) != 0 }
}

/// Write one byte to serial. Blocks until THR empty. Call `init()` first.
pub fn write_byte(b: u8) {
    while !is_transmit_empty() {
        core::hint::spin_loop();
    }
    unsafe { outb(COM1, b) }
}

/// Write a string to serial, translating `\n` to `\r\n`.
pub fn write_str(s: &str) {
    for b in s.bytes() {
        if b == b'\n' {
            write_byte(b'\r');
        }
        write_byte(b);
    }
}

/// Writer struct for use with core::fmt::Write
pub struct Writer;

impl core::fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        write_str(s);
        Ok(())
    }
}

/// Write formatted string to serial (via Writer)
pub fn write_fmt(args: core::fmt::Arguments) {
    use core::fmt::Write;
    let _ = Writer.write_fmt(args);
}
