//! # Framebridge
//!
//! A host bridge between a simulated machine running in its own module and
//! the machine the user sits at.
//!
//! The module draws RGBA frames into its linear memory and reads keyboard
//! events; Framebridge presents those frames and relays keys in order.
//!
//! ## Core Concepts
//!
//! - **Self-healing memory views**: the host's view of module memory is
//!   re-acquired whenever the module grows its memory
//! - **Checked frame copy**: a frame is validated against the memory bounds
//!   before any pixel reaches the display
//! - **Ordered input**: real and scripted keys share one FIFO channel
//! - **Scripted sequences**: timed press/release pairs (hold 300 ms, rest
//!   100 ms) for smoke tests and automation
//! - **Actor model**: input capture and frame pacing run on helper threads
//!   and talk to the session loop over channels
//!
//! ## Example
//!
//! ```rust,ignore
//! use framebridge::{BridgeConfig, CaptureSurface, MatrixDemo, Session};
//!
//! let mut session = Session::start(BridgeConfig::default(), CaptureSurface::new(), || {
//!     Ok::<_, framebridge::BridgeError>(MatrixDemo::new())
//! })?;
//! session.smoke_test(std::time::Instant::now())?;
//! session.run()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod demo;
pub mod error;
pub mod ffi;
pub mod input;
pub mod memory;
pub mod render;
pub mod sequencer;
pub mod session;
pub mod terminal;

// Re-exports for convenience
pub use config::{BridgeConfig, ConfigError};
pub use demo::MatrixDemo;
pub use error::BridgeError;
pub use input::{InputChannel, KeyCode, KeyEvent, KeyParseError};
pub use memory::{LinearMemory, MemoryHandle, ViewError, ViewManager};
pub use render::{CaptureSurface, FrameDescriptor, FrameRenderer, RenderError, Surface, SurfaceError};
pub use sequencer::{Phase, SequenceHandle, Sequencer, SequencerError, SequencerTiming};
pub use session::{Automation, AutomationError, HostEvent, Module, ModuleError, ModuleHost, Session};
pub use terminal::{TerminalGuard, TerminalSurface};
