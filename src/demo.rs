//! A built-in module that draws the keyboard matrix.
//!
//! Each of the 70 keys gets a tile laid out like the physical keyboard
//! (function row on top). A tile lights up while its key is held, so the
//! demo shows both real and scripted input arriving in order.

use crate::input::{KeyCode, KeyEvent, MatrixPosition};
use crate::memory::{LinearMemory, MemoryHandle, PAGE_SIZE};
use crate::render::BYTES_PER_PIXEL;
use crate::session::{Module, ModuleError, ModuleHost};

/// Tile edge in pixels.
const TILE: u32 = 8;
/// Gap between tiles in pixels.
const GAP: u32 = 2;
const PITCH: u32 = TILE + GAP;

/// Frame width in pixels.
pub const FRAME_WIDTH: u32 = MatrixPosition::COLS as u32 * PITCH;
/// Frame height in pixels.
pub const FRAME_HEIGHT: u32 = MatrixPosition::ROWS as u32 * PITCH;
/// Where the frame lives in module memory.
pub const FRAME_OFFSET: usize = 1024;

const FRAME_LEN: usize = (FRAME_WIDTH * FRAME_HEIGHT) as usize * BYTES_PER_PIXEL;

type Matrix = [[bool; MatrixPosition::COLS]; MatrixPosition::ROWS];

/// Matrix slots that carry a key.
const PRESENT: Matrix = {
    let mut table = [[false; MatrixPosition::COLS]; MatrixPosition::ROWS];
    let mut i = 0;
    while i < KeyCode::ALL.len() {
        let pos = KeyCode::ALL[i].matrix_position();
        table[pos.row as usize][pos.col as usize] = true;
        i += 1;
    }
    table
};

const LIT: [u8; 4] = [255, 176, 0, 255];
const KEY: [u8; 4] = [64, 64, 64, 255];
const FUNCTION_KEY: [u8; 4] = [48, 48, 96, 255];
const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Keyboard matrix demo.
pub struct MatrixDemo {
    memory: LinearMemory,
    held: Matrix,
    pixels: Vec<u8>,
    grown: bool,
    frames: u64,
}

impl MatrixDemo {
    /// Create the demo with one page of memory.
    pub fn new() -> Self {
        Self {
            memory: LinearMemory::with_pages(1),
            held: [[false; MatrixPosition::COLS]; MatrixPosition::ROWS],
            pixels: vec![0; FRAME_LEN],
            grown: false,
            frames: 0,
        }
    }

    /// Check whether `key` is currently down.
    pub fn is_held(&self, key: KeyCode) -> bool {
        let pos = key.matrix_position();
        self.held[pos.row as usize][pos.col as usize]
    }

    /// Frames produced so far.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    fn apply(&mut self, event: KeyEvent) {
        let pos = event.code.matrix_position();
        self.held[pos.row as usize][pos.col as usize] = event.down;
        log::debug!("demo key {event} (scan code {:#04x})", pos.scan_code());
    }

    fn paint(&mut self) {
        for (y, row) in self.pixels.chunks_exact_mut(FRAME_WIDTH as usize * BYTES_PER_PIXEL).enumerate() {
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let color = tile_color(&self.held, x as u32, y as u32);
                px.copy_from_slice(&color);
            }
        }
    }
}

impl Default for MatrixDemo {
    fn default() -> Self {
        Self::new()
    }
}

/// Color of frame pixel (x, y).
///
/// Matrix column 0 is the right-most key and row 5 the function row, so
/// both axes are mirrored.
fn tile_color(held: &Matrix, x: u32, y: u32) -> [u8; 4] {
    if x % PITCH >= TILE || y % PITCH >= TILE {
        return BACKGROUND;
    }
    let col = MatrixPosition::COLS - 1 - (x / PITCH) as usize;
    let row = MatrixPosition::ROWS - 1 - (y / PITCH) as usize;

    if !PRESENT[row][col] {
        BACKGROUND
    } else if held[row][col] {
        LIT
    } else if row == MatrixPosition::ROWS - 1 {
        FUNCTION_KEY
    } else {
        KEY
    }
}

impl Module for MatrixDemo {
    type Memory = LinearMemory;

    fn memory(&self) -> LinearMemory {
        self.memory.clone()
    }

    fn step(&mut self, host: &mut dyn ModuleHost) -> Result<(), ModuleError> {
        for event in host.drain_keys() {
            self.apply(event);
        }

        self.paint();
        self.memory
            .write(FRAME_OFFSET, &self.pixels)
            .map_err(|err| ModuleError::Trap(err.to_string()))?;
        host.render_frame(FRAME_OFFSET, FRAME_LEN, FRAME_WIDTH, FRAME_HEIGHT)?;
        self.frames += 1;

        if !self.grown {
            // Detaches every view the host holds
            let old_len = self.memory.grow(1);
            log::info!(
                "demo memory grew from {old_len} to {} bytes",
                old_len + PAGE_SIZE
            );
            self.grown = true;
        }
        Ok(())
    }
}
