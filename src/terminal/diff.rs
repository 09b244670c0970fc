//! Diffing Engine: Generate minimal ANSI sequences from grid changes.
//!
//! 1. Compare the displayed and next grids
//! 2. Emit sequences only for changed cells
//! 3. Skip cursor moves between adjacent cells
//! 4. Track colour state to avoid redundant SGR sequences
//!
//! All output is accumulated in one [`OutputBuffer`] and flushed with one
//! syscall.

use super::cell::{Cell, Rgb};
use super::grid::CellGrid;
use super::output::OutputBuffer;

/// State tracker for the diffing algorithm.
///
/// Tracks what the terminal currently shows (cursor position, colours) so
/// redundant escape sequences can be skipped.
#[derive(Debug, Clone)]
pub struct DiffState {
    /// Last known cursor X position (0-indexed).
    cursor_x: u16,
    /// Last known cursor Y position (0-indexed).
    cursor_y: u16,
    /// Last emitted foreground color.
    fg: Option<Rgb>,
    /// Last emitted background color.
    bg: Option<Rgb>,
}

impl Default for DiffState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffState {
    /// Create a new diff state with the cursor at home and colours unknown.
    pub const fn new() -> Self {
        Self {
            cursor_x: 0,
            cursor_y: 0,
            fg: None,
            bg: None,
        }
    }

    /// Reset the state (e.g., after a full screen clear).
    pub const fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
        // Force cursor move on next write
        self.cursor_x = u16::MAX;
        self.cursor_y = u16::MAX;
    }
}

/// Result of a diff operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Number of cells that were different.
    pub cells_changed: usize,
    /// Number of cursor move sequences emitted.
    pub cursor_moves: usize,
    /// Number of color change sequences emitted.
    pub color_changes: usize,
}

/// Render the difference between two grids into `output`.
///
/// Both grids must have the same dimensions.
pub fn render_diff(
    current: &CellGrid,
    next: &CellGrid,
    output: &mut OutputBuffer,
    state: &mut DiffState,
) -> DiffResult {
    debug_assert_eq!(current.width(), next.width());
    debug_assert_eq!(current.height(), next.height());

    let mut result = DiffResult::default();
    let width = next.width();

    for (y, (current_row, next_row)) in current.rows().zip(next.rows()).enumerate() {
        let y = u16::try_from(y).unwrap_or(u16::MAX);
        for (x, (current_cell, next_cell)) in current_row.iter().zip(next_row).enumerate() {
            if current_cell == next_cell {
                continue;
            }
            let x = u16::try_from(x).unwrap_or(u16::MAX);

            result.cells_changed += 1;

            // Emit cursor move if not adjacent to last position
            if state.cursor_y != y || state.cursor_x != x {
                output.move_to(x, y);
                state.cursor_x = x;
                state.cursor_y = y;
                result.cursor_moves += 1;
            }

            let fg = (state.fg != Some(next_cell.fg())).then_some(next_cell.fg());
            let bg = (state.bg != Some(next_cell.bg())).then_some(next_cell.bg());
            if fg.is_some() || bg.is_some() {
                output.paint(fg, bg);
                state.fg = Some(next_cell.fg());
                state.bg = Some(next_cell.bg());
                result.color_changes += 1;
            }

            output.half_block();

            // The terminal does not wrap us onto the next row reliably at
            // the last column, so force a move there.
            let advance = x.saturating_add(1);
            state.cursor_x = if advance >= width { u16::MAX } else { advance };
        }
    }

    result
}

/// Generate a full redraw sequence (no diffing).
///
/// Used for the first frame and after a resize, when the terminal contents
/// are unknown.
pub fn render_full(grid: &CellGrid, output: &mut OutputBuffer) {
    output.hide_cursor();
    output.clear_screen();

    let mut last: Option<Cell> = None;

    for (y, row) in grid.rows().enumerate() {
        output.move_to(0, u16::try_from(y).unwrap_or(u16::MAX));

        for &cell in row {
            let fg = (last.map(|c| c.fg()) != Some(cell.fg())).then_some(cell.fg());
            let bg = (last.map(|c| c.bg()) != Some(cell.bg())).then_some(cell.bg());
            output.paint(fg, bg);
            output.half_block();
            last = Some(cell);
        }
    }

    output.reset_colors();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::HALF_BLOCK;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn test_diff_identical_grids() {
        let a = CellGrid::new(10, 5);
        let b = CellGrid::new(10, 5);
        let mut output = OutputBuffer::new();
        let mut state = DiffState::new();

        let result = render_diff(&a, &b, &mut output, &mut state);

        assert_eq!(result.cells_changed, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_diff_single_cell_change() {
        let a = CellGrid::new(10, 5);
        let mut b = CellGrid::new(10, 5);
        b.set(5, 2, Cell::new(RED, Rgb::BLACK));

        let mut output = OutputBuffer::new();
        let mut state = DiffState::new();
        let result = render_diff(&a, &b, &mut output, &mut state);

        assert_eq!(result.cells_changed, 1);
        assert_eq!(result.cursor_moves, 1);
        let output_str = String::from_utf8_lossy(output.as_bytes());
        assert!(output_str.starts_with("\x1b[3;6H"));
        assert!(output_str.ends_with(HALF_BLOCK));
    }

    #[test]
    fn test_diff_adjacent_cells_no_cursor_move() {
        let a = CellGrid::new(10, 5);
        let mut b = CellGrid::new(10, 5);
        for x in 0..3 {
            b.set(x, 0, Cell::new(RED, RED));
        }

        let mut output = OutputBuffer::new();
        let mut state = DiffState::new();
        let result = render_diff(&a, &b, &mut output, &mut state);

        assert_eq!(result.cells_changed, 3);
        // Cursor starts at (0,0) and cells are adjacent
        assert_eq!(result.cursor_moves, 0);
        // One combined SGR for the first cell, nothing after
        assert_eq!(result.color_changes, 1);
    }

    #[test]
    fn test_diff_last_column_forces_move() {
        let a = CellGrid::new(2, 2);
        let mut b = CellGrid::new(2, 2);
        b.set(1, 0, Cell::new(RED, RED));
        b.set(0, 1, Cell::new(RED, RED));

        let mut output = OutputBuffer::new();
        let mut state = DiffState::new();
        let result = render_diff(&a, &b, &mut output, &mut state);

        assert_eq!(result.cells_changed, 2);
        assert_eq!(result.cursor_moves, 2);
    }

    #[test]
    fn test_diff_after_reset_moves_cursor() {
        let a = CellGrid::new(4, 1);
        let mut b = CellGrid::new(4, 1);
        b.set(0, 0, Cell::new(RED, RED));

        let mut output = OutputBuffer::new();
        let mut state = DiffState::new();
        state.reset();
        let result = render_diff(&a, &b, &mut output, &mut state);

        assert_eq!(result.cursor_moves, 1);
        assert!(output.as_bytes().starts_with(b"\x1b[H"));
    }

    #[test]
    fn test_render_full() {
        let mut grid = CellGrid::new(3, 2);
        grid.set(0, 0, Cell::new(RED, Rgb::BLACK));

        let mut output = OutputBuffer::new();
        render_full(&grid, &mut output);

        let output_str = String::from_utf8_lossy(output.as_bytes());
        assert!(output_str.starts_with("\x1b[?25l\x1b[2J\x1b[H"));
        assert_eq!(output_str.matches(HALF_BLOCK).count(), 6);
        assert!(output_str.contains("\x1b[2H"));
        assert!(output_str.ends_with("\x1b[0m"));
    }
}
