//! `ViewManager`: Keeps a live view over module memory.

use super::linear::{ByteView, MemoryHandle};

/// Caches a [`ByteView`] and re-acquires it when it goes stale.
///
/// A view is stale when it reports a length of zero, which is what a view
/// looks like after the memory behind it grew or was replaced. Staleness is
/// never an error: the next [`acquire_view`](Self::acquire_view) heals it.
pub struct ViewManager<H: MemoryHandle> {
    /// Runtime memory handle.
    memory: H,
    /// Last view handed out, if any.
    cached: Option<ByteView>,
    /// Number of times a view was (re)built.
    refreshes: u64,
}

impl<H: MemoryHandle> ViewManager<H> {
    /// Create a manager. No view is built until the first acquisition.
    pub const fn new(memory: H) -> Self {
        Self {
            memory,
            cached: None,
            refreshes: 0,
        }
    }

    /// Return a currently valid view over the memory.
    pub fn acquire_view(&mut self) -> &ByteView {
        let stale = self.cached.as_ref().map_or(true, ByteView::is_empty);
        if stale {
            self.cached = Some(self.memory.view());
            self.refreshes += 1;
            log::debug!(
                "acquired memory view #{} ({} bytes)",
                self.refreshes,
                self.memory.byte_len()
            );
        }

        let memory = &self.memory;
        self.cached.get_or_insert_with(|| memory.view())
    }

    /// Number of views built so far.
    #[inline]
    pub const fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Check whether a view is currently cached.
    #[inline]
    pub const fn has_view(&self) -> bool {
        self.cached.is_some()
    }

    /// Get the underlying memory handle.
    #[inline]
    pub const fn memory(&self) -> &H {
        &self.memory
    }
}
