//! Display surfaces.

use super::frame::RgbaFrame;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors raised by a display surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The host environment has no usable display for this surface.
    #[error("display surface unavailable: {0}")]
    Missing(String),

    /// Writing to the display failed.
    #[error("display I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Something that can show an RGBA frame.
///
/// Each `present` replaces whatever the surface showed before; the frame is
/// anchored at the surface's top-left corner.
pub trait Surface {
    /// Show `frame` as the single current contents of the surface.
    fn present(&mut self, frame: RgbaFrame<'_>) -> Result<(), SurfaceError>;

    /// React to the host display changing size.
    fn resize(&mut self, _cols: u16, _rows: u16) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// An owned copy of a presented frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw RGBA bytes, row-major.
    pub pixels: Vec<u8>,
}

impl CapturedFrame {
    /// Borrow the capture as an [`RgbaFrame`].
    pub fn as_frame(&self) -> Option<RgbaFrame<'_>> {
        RgbaFrame::new(self.width, self.height, &self.pixels)
    }
}

#[derive(Debug, Default)]
struct CaptureState {
    latest: Option<CapturedFrame>,
    presented: u64,
}

/// A surface that keeps the exact bytes of the latest frame.
///
/// Clones share the same state, so one clone can be handed to a renderer
/// while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct CaptureSurface {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureSurface {
    /// Create an empty capture surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the most recently presented frame.
    pub fn latest(&self) -> Option<CapturedFrame> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// Number of frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .presented
    }
}

impl Surface for CaptureSurface {
    fn present(&mut self, frame: RgbaFrame<'_>) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // Reuse the previous allocation when the geometry repeats
        if let Some(latest) = state.latest.as_mut() {
            latest.width = frame.width();
            latest.height = frame.height();
            latest.pixels.clear();
            latest.pixels.extend_from_slice(frame.as_bytes());
        } else {
            state.latest = Some(CapturedFrame {
                width: frame.width(),
                height: frame.height(),
                pixels: frame.as_bytes().to_vec(),
            });
        }
        state.presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keeps_latest() {
        let mut surface = CaptureSurface::new();
        let observer = surface.clone();
        assert!(observer.latest().is_none());

        let first = [1u8; 16];
        surface.present(RgbaFrame::new(2, 2, &first).unwrap()).unwrap();
        let second = [2u8; 4];
        surface.present(RgbaFrame::new(1, 1, &second).unwrap()).unwrap();

        let latest = observer.latest().unwrap();
        assert_eq!(latest.width, 1);
        assert_eq!(latest.height, 1);
        assert_eq!(latest.pixels, vec![2; 4]);
        assert_eq!(observer.frames_presented(), 2);
    }
}
