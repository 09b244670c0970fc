//! Frame geometry: descriptors and borrowed RGBA bitmaps.

use thiserror::Error;

/// One 8-bit sample per RGBA channel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A frame descriptor that breaks the geometry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Width, height or length was zero.
    #[error("empty frame: length={length} width={width} height={height}")]
    Empty {
        /// Declared byte length.
        length: usize,
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
    },
    /// The byte length does not match `width * height * 4`.
    #[error("frame length {length} does not match {width}x{height} RGBA")]
    LengthMismatch {
        /// Declared byte length.
        length: usize,
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
    },
}

/// Where a frame lives in module memory and how it is shaped.
///
/// Constructed through [`FrameDescriptor::new`], which enforces
/// `length == width * height * 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    offset: usize,
    length: usize,
    width: u32,
    height: u32,
}

impl FrameDescriptor {
    /// Create a validated descriptor.
    pub fn new(offset: usize, length: usize, width: u32, height: u32) -> Result<Self, FrameError> {
        if length == 0 || width == 0 || height == 0 {
            return Err(FrameError::Empty {
                length,
                width,
                height,
            });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL));
        if expected != Some(length) {
            return Err(FrameError::LengthMismatch {
                length,
                width,
                height,
            });
        }

        Ok(Self {
            offset,
            length,
            width,
            height,
        })
    }

    /// Create a descriptor for a `width x height` frame at `offset`.
    pub fn for_size(offset: usize, width: u32, height: u32) -> Result<Self, FrameError> {
        let length = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(BYTES_PER_PIXEL);
        Self::new(offset, length, width, height)
    }

    /// First byte of the frame in memory.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Frame size in bytes.
    #[inline]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Frame width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// A borrowed row-major RGBA bitmap.
#[derive(Debug, Clone, Copy)]
pub struct RgbaFrame<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> RgbaFrame<'a> {
    /// Wrap `pixels` as a `width x height` bitmap.
    ///
    /// Returns `None` if the slice length does not match the geometry.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)?;
        (expected == pixels.len()).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.pixels
    }

    /// Get the RGBA value at (x, y).
    ///
    /// Returns `None` if out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * BYTES_PER_PIXEL;
        let px = &self.pixels[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Get an iterator over rows of raw bytes.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        self.pixels.chunks(self.width as usize * BYTES_PER_PIXEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_valid() {
        let desc = FrameDescriptor::new(16, 2 * 3 * 4, 2, 3).unwrap();
        assert_eq!(desc.offset(), 16);
        assert_eq!(desc.length(), 24);
        assert_eq!(desc.width(), 2);
        assert_eq!(desc.height(), 3);
    }

    #[test]
    fn test_descriptor_for_size() {
        let desc = FrameDescriptor::for_size(0, 4, 4).unwrap();
        assert_eq!(desc.length(), 64);
    }

    #[test]
    fn test_descriptor_rejects_zero() {
        assert!(matches!(
            FrameDescriptor::new(0, 0, 0, 0),
            Err(FrameError::Empty { .. })
        ));
        assert!(matches!(
            FrameDescriptor::new(0, 16, 0, 4),
            Err(FrameError::Empty { .. })
        ));
    }

    #[test]
    fn test_descriptor_rejects_length_mismatch() {
        // 3 bytes per pixel is not RGBA
        assert_eq!(
            FrameDescriptor::new(0, 12, 2, 2),
            Err(FrameError::LengthMismatch {
                length: 12,
                width: 2,
                height: 2
            })
        );
    }

    #[test]
    fn test_rgba_frame_pixel() {
        let pixels = [
            1, 2, 3, 4, 5, 6, 7, 8, //
            9, 10, 11, 12, 13, 14, 15, 16,
        ];
        let frame = RgbaFrame::new(2, 2, &pixels).unwrap();
        assert_eq!(frame.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(1, 1), Some([13, 14, 15, 16]));
        assert_eq!(frame.pixel(2, 0), None);
        assert_eq!(frame.rows().count(), 2);
    }

    #[test]
    fn test_rgba_frame_rejects_short_slice() {
        assert!(RgbaFrame::new(2, 2, &[0; 15]).is_none());
    }
}
