//! VGA text-mode console (80x25 at physical 0xB8000).
//!
//! The writer is parameterised over its buffer base so that the same logic
//! drives the real text buffer and any other mapped cell array.

use core::{fmt, ptr};
use spin::Mutex;

/// Physical address of the colour text buffer.
pub const VGA_BUFFER: usize = 0xB8000;
pub const WIDTH: usize = 80;
pub const HEIGHT: usize = 25;

const CRTC_INDEX: u16 = 0x3D4;
const CRTC_DATA: u16 = 0x3D5;
const CURSOR_HIGH: u8 = 0x0E;
const CURSOR_LOW: u8 = 0x0F;

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

/// Foreground/background attribute byte of a text cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorCode(u8);

impl ColorCode {
    pub const fn new(foreground: Color, background: Color) -> Self {
        Self(((background as u8) << 4) | (foreground as u8))
    }
}

/// Encoded text cell: character in the low byte, attribute in the high byte.
#[inline(always)]
pub const fn cell(ch: u8, color: ColorCode) -> u16 {
    ((color.0 as u16) << 8) | ch as u16
}

pub struct Writer {
    base: usize,
    width: usize,
    height: usize,
    column: usize,
    row: usize,
    color: ColorCode,
    hardware_cursor: bool,
}

/// The console everybody writes to.
pub static WRITER: Mutex<Writer> = Mutex::new(unsafe { Writer::new(VGA_BUFFER, WIDTH, HEIGHT, true) });

impl Writer {
    /// Creates a writer over `width * height` 16-bit cells at `base`.
    ///
    /// # Safety
    /// `base` must point to at least `width * height` writable `u16` cells for
    /// the lifetime of the writer. `hardware_cursor` may only be set when the
    /// CRT controller ports belong to this console.
    pub const unsafe fn new(base: usize, width: usize, height: usize, hardware_cursor: bool) -> Self {
        Self {
            base,
            width,
            height,
            column: 0,
            row: 0,
            color: ColorCode::new(Color::LightGray, Color::Black),
            hardware_cursor,
        }
    }

    pub fn set_color(&mut self, foreground: Color, background: Color) {
        self.color = ColorCode::new(foreground, background);
    }

    pub fn set_color_code(&mut self, color: ColorCode) {
        self.color = color;
    }

    pub const fn color(&self) -> ColorCode {
        self.color
    }

    pub const fn position(&self) -> (usize, usize) {
        (self.column, self.row)
    }

    #[inline(always)]
    fn ptr(&self) -> *mut u16 {
        self.base as *mut u16
    }

    #[inline(always)]
    fn write_cell(&mut self, index: usize, value: u16) {
        unsafe { ptr::write_volatile(self.ptr().add(index), value) };
    }

    #[inline(always)]
    fn read_cell(&self, index: usize) -> u16 {
        unsafe { ptr::read_volatile(self.ptr().add(index)) }
    }

    fn blank(&self) -> u16 {
        cell(b' ', self.color)
    }

    /// Fill the screen with blanks in the current colour and home the cursor.
    pub fn clear(&mut self) {
        let blank = self.blank();
        for i in 0..self.width * self.height {
            self.write_cell(i, blank);
        }
        self.column = 0;
        self.row = 0;
        self.update_cursor();
    }

    fn scroll_up_one(&mut self) {
        let len = self.width * self.height;
        let visible = len.saturating_sub(self.width);
        for i in 0..visible {
            let src = self.read_cell(i + self.width);
            self.write_cell(i, src);
        }
        let blank = self.blank();
        for i in visible..len {
            self.write_cell(i, blank);
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        match byte {
            b'\n' => {
                self.column = 0;
                self.row += 1;
            }
            b'\r' => self.column = 0,
            0x08 => {
                if self.column > 0 {
                    self.column -= 1;
                    let blank = self.blank();
                    self.write_cell(self.row * self.width + self.column, blank);
                }
            }
            _ => {
                if self.column >= self.width {
                    self.column = 0;
                    self.row += 1;
                }
                self.scroll_if_needed();
                let ch = if byte.is_ascii() { byte } else { b'?' };
                self.write_cell(self.row * self.width + self.column, cell(ch, self.color));
                self.column += 1;
            }
        }
        self.scroll_if_needed();
    }

    fn scroll_if_needed(&mut self) {
        while self.row >= self.height {
            self.scroll_up_one();
            self.row -= 1;
        }
    }

    fn update_cursor(&self) {
        if !self.hardware_cursor {
            return;
        }
        let pos = (self.row * self.width + self.column.min(self.width - 1)) as u16;
        unsafe {
            crate::port::outb(CRTC_INDEX, CURSOR_HIGH);
            crate::port::outb(CRTC_DATA, (pos >> 8) as u8);
            crate::port::outb(CRTC_INDEX, CURSOR_LOW);
            crate::port::outb(CRTC_DATA, (pos & 0xFF) as u8);
        }
    }
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.write_byte(b);
        }
        self.update_cursor();
        Ok(())
    }
}

/// Clear the VGA console.
pub fn clear() {
    WRITER.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    fn screen(width: usize, height: usize) -> (Vec<u16>, Writer) {
        let mut cells = vec![0u16; width * height];
        let writer = unsafe { Writer::new(cells.as_mut_ptr() as usize, width, height, false) };
        (cells, writer)
    }

    fn text(cells: &[u16], row: usize, width: usize) -> String {
        cells[row * width..(row + 1) * width]
            .iter()
            .map(|c| (c & 0xFF) as u8 as char)
            .collect()
    }

    #[test]
    fn writes_characters_with_current_color() {
        let (cells, mut w) = screen(8, 2);
        w.set_color(Color::Yellow, Color::Blue);
        w.write_str("hi").unwrap();
        assert_eq!(cells[0], cell(b'h', ColorCode::new(Color::Yellow, Color::Blue)));
        assert_eq!(cells[1] >> 8, 0x1E);
        assert_eq!(w.position(), (2, 0));
    }

    #[test]
    fn newline_and_carriage_return_move_cursor() {
        let (cells, mut w) = screen(8, 3);
        w.write_str("ab\ncd\rX").unwrap();
        assert_eq!(&text(&cells, 0, 8)[..2], "ab");
        assert_eq!(&text(&cells, 1, 8)[..2], "Xd");
        assert_eq!(w.position(), (1, 1));
    }

    #[test]
    fn long_lines_wrap() {
        let (cells, mut w) = screen(4, 3);
        w.write_str("abcdef").unwrap();
        assert_eq!(text(&cells, 0, 4), "abcd");
        assert_eq!(&text(&cells, 1, 4)[..2], "ef");
    }

    #[test]
    fn scrolls_when_screen_is_full() {
        let (cells, mut w) = screen(4, 2);
        w.clear();
        w.write_str("one\ntwo\nsix").unwrap();
        assert_eq!(text(&cells, 0, 4), "two ");
        assert_eq!(text(&cells, 1, 4), "six ");
        assert_eq!(w.position(), (3, 1));
    }

    #[test]
    fn backspace_erases_previous_cell() {
        let (cells, mut w) = screen(4, 1);
        w.clear();
        w.write_str("ab\x08").unwrap();
        assert_eq!(text(&cells, 0, 4), "a   ");
        assert_eq!(w.position(), (1, 0));
    }

    #[test]
    fn non_ascii_is_replaced() {
        let (cells, mut w) = screen(4, 1);
        w.write_str("é").unwrap();
        assert_eq!(cells[0] & 0xFF, b'?' as u16);
    }
}
