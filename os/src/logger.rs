//! `log` backend that writes to the VGA console and mirrors to COM1.

use core::fmt::Write;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::vga::{self, Color};

pub struct ConsoleLogger {
    max_level: LevelFilter,
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(crate::config::LOG_LEVEL);

impl ConsoleLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }
}

/// Install the console logger. Call once during early init, after `serial::init`.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(LOGGER.max_level);
    Ok(())
}

/// Text colour used for a record of the given level.
pub const fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::LightRed,
        Level::Warn => Color::Yellow,
        Level::Info => Color::LightGray,
        Level::Debug | Level::Trace => Color::DarkGray,
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        {
            let mut writer = vga::WRITER.lock();
            let previous = writer.color();
            writer.set_color(level_color(record.level()), Color::Black);
            let _ = writeln!(writer, "{}", record.args());
            writer.set_color_code(previous);
        }

        if crate::config::SERIAL_MIRROR {
            crate::serial::write_fmt(format_args!(
                "[{}] {}: {}\n",
                record.level(),
                record.target(),
                record.args()
            ));
        }
    }

    fn flush(&self) {}
}
