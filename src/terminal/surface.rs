//! `TerminalSurface`: Presents RGBA frames as half-block cells.

use super::cell::{Cell, Rgb};
use super::diff::{render_diff, render_full, DiffResult, DiffState};
use super::grid::CellGrid;
use super::output::OutputBuffer;
use crate::render::{RgbaFrame, Surface, SurfaceError};
use std::io::{self, IsTerminal, Stdout, Write};

/// A [`Surface`] drawing into a terminal through ANSI sequences.
///
/// The frame is scaled with nearest-neighbour sampling to fit the terminal
/// while keeping its aspect ratio, anchored at the top-left corner. Each
/// frame is diffed against what the terminal already shows, so a static
/// picture costs nothing after the first present.
pub struct TerminalSurface<W: Write> {
    writer: W,
    /// Cells currently on screen.
    current: CellGrid,
    /// Cells being rasterized.
    next: CellGrid,
    diff_state: DiffState,
    output: OutputBuffer,
    needs_full_redraw: bool,
    last_diff: DiffResult,
    bytes_written: u64,
}

impl TerminalSurface<Stdout> {
    /// Open a surface on the process's standard output.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Missing`] if stdout is not a terminal or the
    /// terminal reports a zero size.
    pub fn stdout() -> Result<Self, SurfaceError> {
        let stdout = io::stdout();
        if !stdout.is_terminal() {
            return Err(SurfaceError::Missing("stdout is not a terminal".to_string()));
        }
        let (cols, rows) = crossterm::terminal::size()?;
        Self::new(stdout, cols, rows)
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Create a surface of `cols × rows` cells writing to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Missing`] if either dimension is zero.
    pub fn new(writer: W, cols: u16, rows: u16) -> Result<Self, SurfaceError> {
        if cols == 0 || rows == 0 {
            return Err(SurfaceError::Missing(format!(
                "terminal has no drawable area ({cols}x{rows})"
            )));
        }
        Ok(Self {
            writer,
            current: CellGrid::new(cols, rows),
            next: CellGrid::new(cols, rows),
            diff_state: DiffState::new(),
            output: OutputBuffer::new(),
            needs_full_redraw: true,
            last_diff: DiffResult::default(),
            bytes_written: 0,
        })
    }

    /// Size in cells.
    pub const fn size(&self) -> (u16, u16) {
        (self.current.width(), self.current.height())
    }

    /// Size in pixels (two per cell, stacked).
    pub const fn pixel_size(&self) -> (u32, u32) {
        (self.current.width() as u32, self.current.height() as u32 * 2)
    }

    /// The cells on screen.
    pub const fn grid(&self) -> &CellGrid {
        &self.current
    }

    /// Statistics of the last incremental update.
    pub const fn last_diff(&self) -> DiffResult {
        self.last_diff
    }

    /// Total bytes written to the terminal.
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Get a reference to the writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Force the next present to redraw every cell.
    pub const fn request_full_redraw(&mut self) {
        self.needs_full_redraw = true;
    }

    fn rasterize(&mut self, frame: &RgbaFrame<'_>) {
        let (avail_w, avail_h) = self.pixel_size();
        let (dst_w, dst_h) = fit(frame.width(), frame.height(), avail_w, avail_h);

        let sample = |px: u32, py: u32| -> Rgb {
            if px >= dst_w || py >= dst_h {
                return Rgb::BLACK;
            }
            let sx = scale(px, frame.width(), dst_w);
            let sy = scale(py, frame.height(), dst_h);
            frame.pixel(sx, sy).map_or(Rgb::BLACK, Rgb::from_rgba)
        };

        self.next.fill_with(|x, y| {
            let py = u32::from(y) * 2;
            Cell::new(sample(u32::from(x), py), sample(u32::from(x), py + 1))
        });
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn present(&mut self, frame: RgbaFrame<'_>) -> Result<(), SurfaceError> {
        self.rasterize(&frame);

        self.output.clear();
        self.output.begin_sync();
        let changed = if self.needs_full_redraw {
            render_full(&self.next, &mut self.output);
            self.diff_state.reset();
            self.needs_full_redraw = false;
            true
        } else {
            self.last_diff = render_diff(
                &self.current,
                &self.next,
                &mut self.output,
                &mut self.diff_state,
            );
            self.last_diff.cells_changed > 0
        };

        if changed {
            self.output.end_sync();
            self.output.flush_to(&mut self.writer)?;
            self.bytes_written += self.output.len() as u64;
        }

        // Swap buffers: next becomes current
        self.current.swap(&mut self.next);
        Ok(())
    }

    fn resize(&mut self, cols: u16, rows: u16) -> Result<(), SurfaceError> {
        if cols == 0 || rows == 0 {
            log::debug!("ignoring resize to {cols}x{rows}");
            return Ok(());
        }
        self.current.resize(cols, rows);
        self.next.resize(cols, rows);
        self.needs_full_redraw = true;
        Ok(())
    }
}

/// Largest `w × h` inside `avail_w × avail_h` with the aspect of `src_w × src_h`.
fn fit(src_w: u32, src_h: u32, avail_w: u32, avail_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    let (sw, sh) = (u64::from(src_w), u64::from(src_h));
    let (aw, ah) = (u64::from(avail_w), u64::from(avail_h));

    let (w, h) = if sw * ah <= sh * aw {
        ((sw * ah / sh).max(1), ah)
    } else {
        (aw, (sh * aw / sw).max(1))
    };
    (
        u32::try_from(w).unwrap_or(avail_w),
        u32::try_from(h).unwrap_or(avail_h),
    )
}

/// Map destination coordinate `d` in `0..dst` to `0..src`.
fn scale(d: u32, src: u32, dst: u32) -> u32 {
    let s = u64::from(d) * u64::from(src) / u64::from(dst.max(1));
    u32::try_from(s).unwrap_or(src.saturating_sub(1))
}
