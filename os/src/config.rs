//! Compile-time configuration of the bring-up kernel.

use log::LevelFilter;

/// Version string printed in the welcome banner.
pub const VERSION: &str = concat!("version v", env!("CARGO_PKG_VERSION"));

/// Number of interrupt vectors populated in the IDT.
pub const NUM_INTERRUPTS: usize = 256;

/// Most verbose level the console logger lets through.
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Mirror every log record to COM1 in addition to the VGA console.
pub const SERIAL_MIRROR: bool = true;

/// Size of the stack `_start` sets up before calling into Rust (16 KiB).
pub const BOOT_STACK_SIZE: usize = 16 * 1024;
