//! x86_64 specifics

use core::fmt;
use x86_64::instructions::{hlt, interrupts, port::Port};

/// QEMU/Bochs debug console
pub const DEBUGCON_PORT: u16 = 0xe9;

/// Disable interrupts and halt for good.
pub fn halt() -> ! {
    interrupts::disable();
    loop {
        hlt();
    }
}

/// Byte sink for the debug console port
pub struct DebugCon;

impl DebugCon {
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let mut port = Port::<u8>::new(DEBUGCON_PORT);
        for &byte in bytes {
            // SAFETY: writes to 0xe9 have no side effects beyond the emulator log
            unsafe { port.write(byte) };
        }
    }
}

impl fmt::Write for DebugCon {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}
