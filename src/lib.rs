#![cfg_attr(not(test), no_std)]

//! A minimal 64-bit kernel: flood the VGA text buffer with one glyph and halt.

use core::fmt::{self, Write};

pub mod arch;
pub mod memory;
pub mod serial;
pub mod vga_buffer;

use memory::KernelBase;
use vga_buffer::{Buffer, Color, ColorCode, ScreenChar, Writer};

/// What to write into every cell of the text buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillConfig {
    pub glyph: u8,
    pub color: ColorCode,
}

impl FillConfig {
    /// `'A'`, white on black
    pub const DEFAULT: FillConfig = FillConfig {
        glyph: b'A',
        color: ColorCode::from_raw(0x0f),
    };

    pub const fn new(glyph: u8, color: ColorCode) -> FillConfig {
        FillConfig { glyph, color }
    }

    pub const fn cell(&self) -> ScreenChar {
        ScreenChar::new(self.glyph, self.color)
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        FillConfig::DEFAULT
    }
}

/// Fatal messages: white on red
const ABORT_COLOR: ColorCode = ColorCode::new(Color::White, Color::Red);

/// Fill the text buffer reachable through `base`, then halt.
pub fn run(base: KernelBase, config: &FillConfig) -> ! {
    memory::init(base);
    let addr = base.vga_text_buffer();
    log::info!("text buffer at {:#x}", addr.as_u64());

    // SAFETY: the bootloader maps physical memory at `base`, and nothing
    // else touches the text buffer
    let buffer = unsafe { Buffer::at(addr) };
    let written = vga_buffer::fill(buffer, config);

    if buffer.is_filled_with(config.cell()) {
        log::info!(
            "filled {} cells with {:?} attr {:#04x}",
            written,
            config.glyph as char,
            config.color.as_u8()
        );
    } else {
        log::error!("text buffer readback does not match after filling");
    }

    log::info!("halting");
    arch::halt()
}

/// Print `args` on the top row in white on red and halt.
pub fn abort(args: fmt::Arguments) -> ! {
    // SAFETY: only reached on the way to a halt, so the buffer is ours
    let buffer = unsafe { Buffer::at(memory::kernel_base().vga_text_buffer()) };
    render_abort(buffer, args);
    arch::halt()
}

fn render_abort(buffer: &mut Buffer, args: fmt::Arguments) {
    let mut writer = Writer::new(buffer, ABORT_COLOR);
    let _ = writer.write_fmt(args);
    writer.new_line();
}
