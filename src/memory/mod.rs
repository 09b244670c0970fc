//! Memory module: the bridge's window onto the module's linear memory.
//!
//! This module contains:
//! - [`LinearMemory`]: A growable byte region owned by the module runtime
//! - [`ByteView`]: A revocable view over the region's current buffer
//! - [`MemoryHandle`]: The runtime contract the bridge reads memory through
//! - [`ViewManager`]: Caches a view and re-acquires it once it goes stale
//!
//! # Detachment
//!
//! Growing or replacing a [`LinearMemory`] moves its bytes into a new buffer.
//! Every view handed out before that point reports a length of zero from then
//! on and never follows the memory to its new buffer.
//!
//! ```text
//! view A ──▶ [buffer 1: 64 KiB]      grow(1)      view A ──▶ [detached: 0 B]
//!                                   ─────────▶    view B ──▶ [buffer 2: 128 KiB]
//! ```

mod linear;
mod view;

pub use linear::{ByteView, LinearMemory, MemoryHandle, ViewError, PAGE_SIZE};
pub use view::ViewManager;
