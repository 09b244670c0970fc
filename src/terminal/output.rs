//! `OutputBuffer`: One frame's worth of escape sequences, written at once.

use super::cell::{Rgb, HALF_BLOCK};
use std::io::{self, Write};

/// Bytes of a 200×50 full redraw with every cell changing colour.
const FRAME_CAPACITY: usize = 64 * 1024;

/// Accumulates the escape sequences for one presented frame.
///
/// Everything for a frame is built here first and handed to the terminal
/// with a single `write_all`, bracketed by synchronized-update markers so
/// terminals that support them never show a half-drawn frame. Terminals
/// that don't simply ignore the markers.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a full redraw of a large terminal.
    pub fn new() -> Self {
        Self::with_capacity(FRAME_CAPACITY)
    }

    /// Drop the previous frame's bytes, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Bytes built so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes built so far.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether nothing has been built.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Open a synchronized update (DEC mode 2026).
    #[inline]
    pub fn begin_sync(&mut self) {
        self.data.extend_from_slice(b"\x1b[?2026h");
    }

    /// Close a synchronized update.
    #[inline]
    pub fn end_sync(&mut self) {
        self.data.extend_from_slice(b"\x1b[?2026l");
    }

    /// Move the cursor to cell (x, y), 0-indexed.
    ///
    /// Home and column-one moves use the shorter `CSI H` / `CSI row H`.
    pub fn move_to(&mut self, x: u16, y: u16) {
        let row = u32::from(y) + 1;
        let col = u32::from(x) + 1;
        // Writing into a Vec cannot fail
        let _ = match (row, col) {
            (1, 1) => self.data.write_all(b"\x1b[H"),
            (_, 1) => write!(self.data, "\x1b[{row}H"),
            _ => write!(self.data, "\x1b[{row};{col}H"),
        };
    }

    /// Set the upper (`fg`) and/or lower (`bg`) pixel colour in one SGR.
    ///
    /// Emits nothing when both are `None`.
    pub fn paint(&mut self, fg: Option<Rgb>, bg: Option<Rgb>) {
        let _ = match (fg, bg) {
            (Some(f), Some(b)) => write!(
                self.data,
                "\x1b[38;2;{};{};{};48;2;{};{};{}m",
                f.r, f.g, f.b, b.r, b.g, b.b
            ),
            (Some(f), None) => write!(self.data, "\x1b[38;2;{};{};{}m", f.r, f.g, f.b),
            (None, Some(b)) => write!(self.data, "\x1b[48;2;{};{};{}m", b.r, b.g, b.b),
            (None, None) => Ok(()),
        };
    }

    /// Draw one cell's glyph at the cursor.
    #[inline]
    pub fn half_block(&mut self) {
        let mut utf8 = [0u8; 4];
        self.data
            .extend_from_slice(HALF_BLOCK.encode_utf8(&mut utf8).as_bytes());
    }

    /// Hide the cursor.
    #[inline]
    pub fn hide_cursor(&mut self) {
        self.data.extend_from_slice(b"\x1b[?25l");
    }

    /// Erase the whole screen.
    #[inline]
    pub fn clear_screen(&mut self) {
        self.data.extend_from_slice(b"\x1b[2J");
    }

    /// Reset colours so nothing leaks past the frame.
    #[inline]
    pub fn reset_colors(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
    }

    /// Write the frame to `writer` and flush it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
