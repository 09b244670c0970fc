//! The contract between the bridge and the simulated machine.

use crate::input::KeyEvent;
use crate::memory::MemoryHandle;
use crate::render::RenderError;
use thiserror::Error;

/// Errors a module reports from a step.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module hit an unrecoverable fault.
    #[error("module trapped: {0}")]
    Trap(String),

    /// The module chose to propagate a failed render.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What a running module can call back into.
pub trait ModuleHost {
    /// Present the frame at `offset..offset + length` of module memory.
    ///
    /// # Errors
    ///
    /// Fails the call (not the session) if the descriptor is invalid or out
    /// of bounds.
    fn render_frame(
        &mut self,
        offset: usize,
        length: usize,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError>;

    /// Take the oldest buffered key event.
    fn poll_key(&mut self) -> Option<KeyEvent>;

    /// Take every buffered key event, oldest first.
    fn drain_keys(&mut self) -> Vec<KeyEvent>;
}

/// A compiled machine core driven by the bridge.
pub trait Module {
    /// Handle to the module's linear memory.
    type Memory: MemoryHandle;

    /// The module's memory. Called once at session start.
    fn memory(&self) -> Self::Memory;

    /// Run the module for one frame.
    ///
    /// # Errors
    ///
    /// An error stops the session.
    fn step(&mut self, host: &mut dyn ModuleHost) -> Result<(), ModuleError>;
}
