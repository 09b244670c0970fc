//! `FrameRenderer`: Copies frames out of module memory and presents them.

use super::frame::{FrameDescriptor, FrameError, RgbaFrame};
use super::surface::{Surface, SurfaceError};
use crate::memory::{MemoryHandle, ViewError, ViewManager};
use std::time::Instant;
use thiserror::Error;

/// Errors from a single render call.
///
/// None of these are fatal to the session; they fail the render call that
/// raised them and leave the surface untouched.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The descriptor broke the geometry contract.
    #[error("invalid frame descriptor: {0}")]
    InvalidFrame(#[from] FrameError),

    /// The frame range does not fit in module memory.
    #[error("frame out of bounds: offset={offset} length={length} memory_len={memory_len}")]
    OutOfBounds {
        /// First byte of the frame.
        offset: usize,
        /// Frame size in bytes.
        length: usize,
        /// Memory size at the time of the read.
        memory_len: usize,
    },

    /// The surface failed to present the frame.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl From<ViewError> for RenderError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::OutOfBounds {
                offset,
                length,
                buffer_len,
            } => Self::OutOfBounds {
                offset,
                length,
                memory_len: buffer_len,
            },
        }
    }
}

/// Render statistics for debugging/profiling.
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Frames presented.
    pub frames: u64,
    /// Render calls rejected before anything was painted.
    pub rejected: u64,
    /// Total bytes copied out of module memory.
    pub bytes_copied: u64,
    /// Average render time in microseconds.
    pub avg_render_us: u64,
    /// Last render time in microseconds.
    pub last_render_us: u64,
}

/// Moves frames from module memory onto a [`Surface`].
pub struct FrameRenderer<H: MemoryHandle, S: Surface> {
    /// Live view over module memory.
    views: ViewManager<H>,
    /// Where frames end up.
    surface: S,
    /// Reused copy target so steady-state rendering does not allocate.
    scratch: Vec<u8>,
    /// Render statistics.
    stats: RenderStats,
}

impl<H: MemoryHandle, S: Surface> FrameRenderer<H, S> {
    /// Create a renderer reading from `memory` and painting on `surface`.
    pub fn new(memory: H, surface: S) -> Self {
        Self {
            views: ViewManager::new(memory),
            surface,
            scratch: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    /// Render the frame described by `descriptor`.
    ///
    /// The frame bytes are copied out of memory in one piece before the
    /// surface sees them, so the presented bitmap is exactly what memory held
    /// at the moment of the copy.
    pub fn render(&mut self, descriptor: &FrameDescriptor) -> Result<(), RenderError> {
        let start = Instant::now();

        let view = self.views.acquire_view();
        if let Err(err) = view.copy_range(descriptor.offset(), descriptor.length(), &mut self.scratch) {
            self.stats.rejected += 1;
            return Err(err.into());
        }

        let Some(frame) = RgbaFrame::new(descriptor.width(), descriptor.height(), &self.scratch) else {
            // FrameDescriptor guarantees the geometry; a mismatch here means
            // the copy came back short.
            self.stats.rejected += 1;
            return Err(FrameError::LengthMismatch {
                length: self.scratch.len(),
                width: descriptor.width(),
                height: descriptor.height(),
            }
            .into());
        };
        self.surface.present(frame)?;

        // Update stats
        let elapsed = start.elapsed();
        self.stats.frames += 1;
        self.stats.bytes_copied += descriptor.length() as u64;
        self.stats.last_render_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        // Smoothed average
        if self.stats.avg_render_us == 0 {
            self.stats.avg_render_us = self.stats.last_render_us;
        } else {
            self.stats.avg_render_us =
                (self.stats.avg_render_us * 15 + self.stats.last_render_us) / 16;
        }

        Ok(())
    }

    /// Render from raw frame metadata, as handed over by the module.
    pub fn render_frame(
        &mut self,
        offset: usize,
        length: usize,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let descriptor = match FrameDescriptor::new(offset, length, width, height) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                self.stats.rejected += 1;
                return Err(err.into());
            }
        };
        self.render(&descriptor)
    }

    /// Forward a display resize to the surface.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), RenderError> {
        self.surface.resize(cols, rows)?;
        Ok(())
    }

    /// Get the render statistics.
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Get the view manager.
    pub const fn views(&self) -> &ViewManager<H> {
        &self.views
    }

    /// Get a reference to the surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Get a mutable reference to the surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
