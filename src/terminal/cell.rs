//! Cell: Two stacked pixels in one terminal character.
//!
//! Each terminal cell shows the upper half block `▀`: the foreground colour
//! paints the upper pixel, the background colour paints the lower one. A
//! `cols × rows` terminal therefore displays `cols × 2·rows` pixels.
//!
//! ```text
//! ┌─────────┐
//! │  upper  │  fg
//! ├─────────┤
//! │  lower  │  bg
//! └─────────┘
//! ```

/// Glyph drawn in every cell.
pub const HALF_BLOCK: char = '▀';

/// True-color RGB representation.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black (0, 0, 0)
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Take the colour channels of an RGBA pixel, dropping alpha.
    #[inline]
    pub const fn from_rgba([r, g, b, _]: [u8; 4]) -> Self {
        Self::new(r, g, b)
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 4]> for Rgb {
    #[inline]
    fn from(rgba: [u8; 4]) -> Self {
        Self::from_rgba(rgba)
    }
}

/// A single terminal cell holding two vertically stacked pixels.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Cell {
    upper: Rgb,
    lower: Rgb,
}

impl Cell {
    /// Both pixels black.
    pub const EMPTY: Self = Self::new(Rgb::BLACK, Rgb::BLACK);

    /// Create a cell from its two pixels.
    #[inline]
    pub const fn new(upper: Rgb, lower: Rgb) -> Self {
        Self { upper, lower }
    }

    /// The upper pixel, drawn as foreground.
    #[inline]
    pub const fn fg(&self) -> Rgb {
        self.upper
    }

    /// The lower pixel, drawn as background.
    #[inline]
    pub const fn bg(&self) -> Rgb {
        self.lower
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cell({:?}/{:?})", self.upper, self.lower)
    }
}
