//! VGA text mode buffer
//!
//! A volatile view over the 80x25 memory-mapped text buffer, the routine
//! that floods it with a single glyph, and a small console writer used for
//! fatal messages.

use core::fmt;
use volatile::Volatile;
use x86_64::VirtAddr;

use crate::FillConfig;

/// VGA buffer dimensions
pub const BUFFER_HEIGHT: usize = 25;
pub const BUFFER_WIDTH: usize = 80;
pub const BUFFER_CELLS: usize = BUFFER_WIDTH * BUFFER_HEIGHT;

/// Standard VGA color palette
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

/// Attribute byte: background in the high nibble, foreground in the low one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorCode(u8);

impl ColorCode {
    pub const fn new(foreground: Color, background: Color) -> ColorCode {
        ColorCode((background as u8) << 4 | (foreground as u8))
    }

    /// Use a raw attribute byte as-is, e.g. `0x0f` for white on black.
    pub const fn from_raw(attribute: u8) -> ColorCode {
        ColorCode(attribute)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    pub const fn foreground(self) -> u8 {
        self.0 & 0x0f
    }

    pub const fn background(self) -> u8 {
        self.0 >> 4
    }
}

/// One hardware cell: character byte followed by attribute byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ScreenChar {
    ascii_character: u8,
    color_code: ColorCode,
}

impl ScreenChar {
    pub const fn new(ascii_character: u8, color_code: ColorCode) -> ScreenChar {
        ScreenChar {
            ascii_character,
            color_code,
        }
    }

    pub const fn blank(color_code: ColorCode) -> ScreenChar {
        ScreenChar::new(b' ', color_code)
    }

    pub const fn ascii_character(self) -> u8 {
        self.ascii_character
    }

    pub const fn color_code(self) -> ColorCode {
        self.color_code
    }
}

/// The text buffer, laid out exactly as the hardware expects it
#[repr(transparent)]
pub struct Buffer {
    chars: [[Volatile<ScreenChar>; BUFFER_WIDTH]; BUFFER_HEIGHT],
}

impl Buffer {
    /// View the text buffer mapped at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must point to `BUFFER_CELLS` writable cells that nothing else
    /// borrows for the lifetime of the returned reference.
    pub unsafe fn at(addr: VirtAddr) -> &'static mut Buffer {
        unsafe { Self::from_ptr(addr.as_mut_ptr()) }
    }

    /// View `BUFFER_CELLS` consecutive cells starting at `ptr` as a buffer.
    ///
    /// # Safety
    ///
    /// Same contract as [`Buffer::at`], with the lifetime chosen by the caller.
    pub unsafe fn from_ptr<'a>(ptr: *mut ScreenChar) -> &'a mut Buffer {
        // Volatile<T> and Buffer are both repr(transparent)
        unsafe { &mut *(ptr as *mut Buffer) }
    }

    /// Write `cell` into every cell, row-major, and return how many were written.
    pub fn fill(&mut self, cell: ScreenChar) -> usize {
        let mut written = 0;
        for row in self.chars.iter_mut() {
            for slot in row.iter_mut() {
                slot.write(cell);
                written += 1;
            }
        }
        written
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<ScreenChar> {
        self.chars.get(row)?.get(col).map(Volatile::read)
    }

    pub fn is_filled_with(&self, cell: ScreenChar) -> bool {
        self.chars.iter().flatten().all(|slot| slot.read() == cell)
    }

    fn write(&mut self, row: usize, col: usize, cell: ScreenChar) {
        self.chars[row][col].write(cell);
    }
}

/// Flood `buffer` with the configured glyph and attribute.
pub fn fill(buffer: &mut Buffer, config: &FillConfig) -> usize {
    let written = buffer.fill(config.cell());
    log::trace!(
        "wrote {:?} / {:#04x} into {} cells",
        config.glyph as char,
        config.color.as_u8(),
        written
    );
    written
}

/// Console writer on top of a [`Buffer`]
pub struct Writer<'a> {
    column_position: usize,
    row_position: usize,
    color_code: ColorCode,
    buffer: &'a mut Buffer,
}

impl<'a> Writer<'a> {
    /// Start writing at the top-left corner.
    pub fn new(buffer: &'a mut Buffer, color_code: ColorCode) -> Writer<'a> {
        Writer {
            column_position: 0,
            row_position: 0,
            color_code,
            buffer,
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.new_line(),
            byte => {
                if self.column_position >= BUFFER_WIDTH {
                    self.new_line();
                }

                let cell = ScreenChar::new(byte, self.color_code);
                self.buffer
                    .write(self.row_position, self.column_position, cell);
                self.column_position += 1;
            }
        }
    }

    pub fn write_string(&mut self, s: &str) {
        for byte in s.bytes() {
            match byte {
                // Printable ASCII byte or newline
                0x20..=0x7e | b'\n' => self.write_byte(byte),
                _ => self.write_byte(0xfe),
            }
        }
    }

    /// Move to the start of the next row, scrolling at the bottom.
    pub fn new_line(&mut self) {
        if self.row_position >= BUFFER_HEIGHT - 1 {
            self.scroll_up();
        } else {
            self.row_position += 1;
        }
        self.column_position = 0;
    }

    fn scroll_up(&mut self) {
        for row in 1..BUFFER_HEIGHT {
            for col in 0..BUFFER_WIDTH {
                let character = self.buffer.chars[row][col].read();
                self.buffer.write(row - 1, col, character);
            }
        }
        self.clear_row(BUFFER_HEIGHT - 1);
    }

    fn clear_row(&mut self, row: usize) {
        let blank = ScreenChar::blank(self.color_code);
        for col in 0..BUFFER_WIDTH {
            self.buffer.write(row, col, blank);
        }
    }

    pub fn clear_screen(&mut self) {
        self.buffer.fill(ScreenChar::blank(self.color_code));
        self.column_position = 0;
        self.row_position = 0;
    }

    pub fn set_color(&mut self, foreground: Color, background: Color) {
        self.color_code = ColorCode::new(foreground, background);
    }

    /// Current (row, column)
    pub fn position(&self) -> (usize, usize) {
        (self.row_position, self.column_position)
    }
}

impl fmt::Write for Writer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use core::mem::size_of;

    fn with_buffer<R>(initial: ScreenChar, f: impl FnOnce(&mut Buffer) -> R) -> R {
        let mut cells = vec![initial; BUFFER_CELLS];
        let buffer = unsafe { Buffer::from_ptr(cells.as_mut_ptr()) };
        f(buffer)
    }

    fn garbage() -> ScreenChar {
        ScreenChar::new(0xaa, ColorCode::from_raw(0x55))
    }

    fn row_text(buffer: &Buffer, row: usize, len: usize) -> String {
        (0..len)
            .map(|col| buffer.cell(row, col).unwrap().ascii_character() as char)
            .collect()
    }

    #[test]
    fn layout_matches_hardware() {
        assert_eq!(size_of::<ScreenChar>(), 2);
        assert_eq!(size_of::<Buffer>(), BUFFER_CELLS * 2);
        assert_eq!(BUFFER_CELLS, 2000);
    }

    #[test]
    fn color_code_packs_nibbles() {
        let white_on_black = ColorCode::new(Color::White, Color::Black);
        assert_eq!(white_on_black.as_u8(), 0x0f);
        assert_eq!(white_on_black, ColorCode::from_raw(0x0f));

        let white_on_red = ColorCode::new(Color::White, Color::Red);
        assert_eq!(white_on_red.as_u8(), 0x4f);
        assert_eq!(white_on_red.foreground(), Color::White as u8);
        assert_eq!(white_on_red.background(), Color::Red as u8);
    }

    #[test]
    fn fill_overwrites_every_cell() {
        with_buffer(garbage(), |buffer| {
            let config = FillConfig::DEFAULT;
            assert_eq!(fill(buffer, &config), BUFFER_CELLS);
            assert!(buffer.is_filled_with(config.cell()));

            let first = buffer.cell(0, 0).unwrap();
            let last = buffer.cell(BUFFER_HEIGHT - 1, BUFFER_WIDTH - 1).unwrap();
            assert_eq!(first.ascii_character(), b'A');
            assert_eq!(first.color_code().as_u8(), 0x0f);
            assert_eq!(first, last);
        });
    }

    #[test]
    fn fill_writes_raw_bytes_in_memory_order() {
        let mut cells = vec![garbage(); BUFFER_CELLS];
        let buffer = unsafe { Buffer::from_ptr(cells.as_mut_ptr()) };
        buffer.fill(FillConfig::DEFAULT.cell());

        let bytes = unsafe {
            core::slice::from_raw_parts(cells.as_ptr() as *const u8, BUFFER_CELLS * 2)
        };
        assert!(bytes.chunks(2).all(|cell| cell == [b'A', 0x0f]));
    }

    #[test]
    fn partial_content_is_not_filled() {
        with_buffer(garbage(), |buffer| {
            let cell = FillConfig::DEFAULT.cell();
            buffer.fill(cell);
            buffer.write(12, 40, garbage());
            assert!(!buffer.is_filled_with(cell));
        });
    }

    #[test]
    fn cell_out_of_range() {
        with_buffer(garbage(), |buffer| {
            assert!(buffer.cell(BUFFER_HEIGHT, 0).is_none());
            assert!(buffer.cell(0, BUFFER_WIDTH).is_none());
            assert_eq!(buffer.cell(BUFFER_HEIGHT - 1, BUFFER_WIDTH - 1), Some(garbage()));
        });
    }

    #[test]
    fn writer_wraps_long_lines() {
        let color = ColorCode::new(Color::LightGray, Color::Black);
        with_buffer(ScreenChar::blank(color), |buffer| {
            let mut writer = Writer::new(buffer, color);
            for _ in 0..BUFFER_WIDTH {
                writer.write_byte(b'x');
            }
            writer.write_byte(b'y');
            assert_eq!(writer.position(), (1, 1));
            assert_eq!(buffer.cell(1, 0).unwrap().ascii_character(), b'y');
            assert_eq!(buffer.cell(0, BUFFER_WIDTH - 1).unwrap().ascii_character(), b'x');
        });
    }

    #[test]
    fn writer_scrolls_at_bottom() {
        let color = ColorCode::new(Color::LightGray, Color::Black);
        with_buffer(ScreenChar::blank(color), |buffer| {
            let mut writer = Writer::new(buffer, color);
            writer.write_string("first\nsecond");
            for _ in 0..BUFFER_HEIGHT - 2 {
                writer.new_line();
            }
            assert_eq!(writer.position(), (BUFFER_HEIGHT - 1, 0));
            drop(writer);
            assert_eq!(row_text(buffer, 0, 5), "first");

            let mut writer = Writer::new(buffer, color);
            writer.row_position = BUFFER_HEIGHT - 1;
            writer.new_line();
            assert_eq!(writer.position(), (BUFFER_HEIGHT - 1, 0));
            drop(writer);
            assert_eq!(row_text(buffer, 0, 6), "second");
            assert_eq!(row_text(buffer, BUFFER_HEIGHT - 1, 3), "   ");
        });
    }

    #[test]
    fn writer_replaces_unprintable_bytes() {
        let color = ColorCode::new(Color::White, Color::Black);
        with_buffer(ScreenChar::blank(color), |buffer| {
            let mut writer = Writer::new(buffer, color);
            write!(writer, "a\u{7}é").unwrap();
            assert_eq!(writer.position(), (0, 4));
            drop(writer);
            let text: Vec<u8> = (0..4)
                .map(|col| buffer.cell(0, col).unwrap().ascii_character())
                .collect();
            assert_eq!(text, [b'a', 0xfe, 0xfe, 0xfe]);
        });
    }

    #[test]
    fn clear_screen_uses_current_color() {
        with_buffer(garbage(), |buffer| {
            let mut writer = Writer::new(buffer, ColorCode::from_raw(0x0f));
            writer.write_string("hello");
            writer.set_color(Color::Yellow, Color::Blue);
            writer.clear_screen();
            assert_eq!(writer.position(), (0, 0));
            drop(writer);
            let blank = ScreenChar::blank(ColorCode::new(Color::Yellow, Color::Blue));
            assert!(buffer.is_filled_with(blank));
        });
    }
}
