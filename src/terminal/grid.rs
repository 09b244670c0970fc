//! `CellGrid`: The screen as rows of half-block cells.
//!
//! Cells are stored contiguously in row-major order, so a row is a slice
//! and a cell at (x, y) lives at `y * width + x`.

use super::cell::Cell;

/// One screen of half-block cells.
#[derive(Clone, PartialEq, Eq)]
pub struct CellGrid {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
}

impl CellGrid {
    /// Create a black grid. A zero dimension yields an empty grid.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
            width,
            height,
        }
    }

    /// Width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// The cell at (x, y), if on screen.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index_of(x, y).and_then(|i| self.cells.get(i))
    }

    /// Overwrite the cell at (x, y). Returns `false` if off screen.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        match self.index_of(x, y).and_then(|i| self.cells.get_mut(i)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Recompute every cell from its coordinates, row by row.
    pub fn fill_with<F>(&mut self, mut cell_at: F)
    where
        F: FnMut(u16, u16) -> Cell,
    {
        let width = usize::from(self.width.max(1));
        for (y, row) in (0..self.height).zip(self.cells.chunks_mut(width)) {
            for (x, slot) in (0..self.width).zip(row) {
                *slot = cell_at(x, y);
            }
        }
    }

    /// Change the dimensions. Content is discarded.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    /// Exchange contents with `other` (front/back buffer flip).
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(usize::from(self.width.max(1)))
    }
}

impl std::fmt::Debug for CellGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellGrid")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
