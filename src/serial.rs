//! Serial console (COM1) and the `log` backend that writes to it.

use core::fmt::{self, Write};
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::{Lazy, Mutex};
use uart_16550::SerialPort;
use x86_64::instructions::interrupts;

/// COM1 base port
pub const COM1: u16 = 0x3F8;

static SERIAL1: Lazy<Mutex<SerialPort>> = Lazy::new(|| {
    let mut serial_port = unsafe { SerialPort::new(COM1) };
    serial_port.init();
    Mutex::new(serial_port)
});

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    interrupts::without_interrupts(|| {
        let _ = SERIAL1.lock().write_fmt(args);
        #[cfg(feature = "debugcon")]
        let _ = crate::arch::DebugCon.write_fmt(args);
    });
}

/// Print to COM1
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*))
    };
}

/// Print to COM1, with a newline
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)));
}

/// Format one log line: `[LEVEL] target: message`.
pub fn write_record(out: &mut impl Write, record: &Record) -> fmt::Result {
    writeln!(out, "[{:<5}] {}: {}", record.level(), record.target(), record.args())
}

struct SerialLogger;

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupts::without_interrupts(|| {
            let _ = write_record(&mut *SERIAL1.lock(), record);
            #[cfg(feature = "debugcon")]
            let _ = write_record(&mut crate::arch::DebugCon, record);
        });
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

/// Install the serial logger. Fails only if a logger is already set.
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
