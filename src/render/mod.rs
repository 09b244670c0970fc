//! Render module: Moves finished frames from module memory to a surface.
//!
//! This module contains:
//! - [`FrameDescriptor`]: Where a frame lives in memory and how big it is
//! - [`RgbaFrame`]: A borrowed row-major RGBA bitmap
//! - [`Surface`]: Anything that can present a frame
//! - [`CaptureSurface`]: A surface that keeps the exact bytes it was shown
//! - [`FrameRenderer`]: Copies a frame out of memory and presents it
//!
//! # Flow
//!
//! ```text
//! render_frame(offset, length, w, h)
//!        │
//!        ▼
//! ┌──────────────┐  acquire   ┌─────────────┐  one memcpy  ┌─────────┐  present  ┌─────────┐
//! │FrameRenderer │ ─────────▶ │ ViewManager │ ───────────▶ │ scratch │ ────────▶ │ Surface │
//! └──────────────┘            └─────────────┘              └─────────┘           └─────────┘
//! ```

mod frame;
mod renderer;
mod surface;

pub use frame::{FrameDescriptor, FrameError, RgbaFrame, BYTES_PER_PIXEL};
pub use renderer::{FrameRenderer, RenderError, RenderStats};
pub use surface::{CaptureSurface, CapturedFrame, Surface, SurfaceError};
