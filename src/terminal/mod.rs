//! Terminal display: RGBA frames drawn with half-block characters.
//!
//! A frame is rasterized into a [`CellGrid`] where each cell carries two
//! stacked pixels, diffed against the grid already on screen, and written
//! out as one ANSI byte string.

mod cell;
mod diff;
mod grid;
mod guard;
mod output;
mod surface;

pub use cell::{Cell, Rgb, HALF_BLOCK};
pub use diff::{render_diff, render_full, DiffResult, DiffState};
pub use grid::CellGrid;
pub use guard::{TerminalGuard, KEYBOARD_FLAGS};
pub use output::OutputBuffer;
pub use surface::TerminalSurface;
