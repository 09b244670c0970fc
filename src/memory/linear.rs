//! `LinearMemory`: A growable byte region with detaching views.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Size of one memory page in bytes (64 KiB).
pub const PAGE_SIZE: usize = 64 * 1024;

/// Shared storage behind a single buffer generation.
type Backing = Arc<RwLock<Vec<u8>>>;

/// Errors raised when a view is read or written outside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The requested range does not fit in the buffer.
    #[error("out of bounds: offset={offset} length={length} buffer_len={buffer_len}")]
    OutOfBounds {
        /// First byte of the requested range.
        offset: usize,
        /// Number of bytes requested.
        length: usize,
        /// Length of the buffer at the time of the access.
        buffer_len: usize,
    },
}

/// Runtime side of the memory contract.
///
/// The bridge never owns module memory. It asks the runtime for the current
/// length and for a fresh view whenever the one it holds has gone stale.
pub trait MemoryHandle {
    /// Current length of the memory region in bytes.
    fn byte_len(&self) -> usize;

    /// Build a view over the region's current buffer.
    fn view(&self) -> ByteView;
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Checked `offset..offset + length` against a buffer length.
fn checked_range(
    offset: usize,
    length: usize,
    buffer_len: usize,
) -> Result<std::ops::Range<usize>, ViewError> {
    match offset.checked_add(length) {
        Some(end) if end <= buffer_len => Ok(offset..end),
        _ => Err(ViewError::OutOfBounds {
            offset,
            length,
            buffer_len,
        }),
    }
}

/// A revocable, byte-addressable view over one buffer generation.
///
/// Cloning a view is cheap (a reference count bump). Once the memory it was
/// taken from grows or is replaced, the view is detached and reports a length
/// of zero.
#[derive(Clone)]
pub struct ByteView {
    backing: Backing,
}

impl ByteView {
    /// Current length of the viewed buffer (zero once detached).
    #[inline]
    pub fn len(&self) -> usize {
        read_lock(&self.backing).len()
    }

    /// Check if the view is empty, which is how detachment shows up.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `length` bytes starting at `offset` into `out`.
    ///
    /// The copy is one contiguous `memcpy` taken under the buffer's read
    /// lock, so a concurrent writer can never interleave with it. `out` is
    /// cleared first and left empty on error.
    pub fn copy_range(&self, offset: usize, length: usize, out: &mut Vec<u8>) -> Result<(), ViewError> {
        out.clear();
        let bytes = read_lock(&self.backing);
        let range = checked_range(offset, length, bytes.len())?;
        out.extend_from_slice(&bytes[range]);
        Ok(())
    }

    /// Read `length` bytes starting at `offset` into a new vector.
    pub fn read(&self, offset: usize, length: usize) -> Result<Vec<u8>, ViewError> {
        let mut out = Vec::with_capacity(length);
        self.copy_range(offset, length, &mut out)?;
        Ok(out)
    }

    /// Write `data` at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), ViewError> {
        let mut bytes = write_lock(&self.backing);
        let range = checked_range(offset, data.len(), bytes.len())?;
        bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Check whether two views share the same buffer generation.
    #[inline]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }
}

impl std::fmt::Debug for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteView").field("len", &self.len()).finish()
    }
}

/// A growable linear memory, shared between the module and the bridge.
///
/// Handles are cheap to clone and all point at the same region.
#[derive(Clone)]
pub struct LinearMemory {
    current: Arc<RwLock<Backing>>,
}

impl LinearMemory {
    /// Create a zero-filled memory of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(RwLock::new(vec![0; len])))),
        }
    }

    /// Create a zero-filled memory of `pages` 64 KiB pages.
    pub fn with_pages(pages: usize) -> Self {
        Self::new(pages * PAGE_SIZE)
    }

    /// Grow the memory by `additional_pages`, detaching all existing views.
    ///
    /// Existing contents are preserved at the same offsets. Returns the
    /// previous length in bytes.
    pub fn grow(&self, additional_pages: usize) -> usize {
        let mut current = write_lock(&self.current);
        let mut bytes = std::mem::take(&mut *write_lock(&**current));
        let old_len = bytes.len();
        bytes.resize(old_len + additional_pages * PAGE_SIZE, 0);
        *current = Arc::new(RwLock::new(bytes));
        log::debug!("linear memory grew from {old_len} to {} bytes", read_lock(&**current).len());
        old_len
    }

    /// Swap in a brand new buffer, detaching all existing views.
    pub fn replace(&self, bytes: Vec<u8>) {
        let mut current = write_lock(&self.current);
        write_lock(&**current).clear();
        *current = Arc::new(RwLock::new(bytes));
    }

    /// Write `data` at `offset` in the current buffer.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), ViewError> {
        self.view().write(offset, data)
    }

    /// Read `length` bytes at `offset` from the current buffer.
    pub fn read(&self, offset: usize, length: usize) -> Result<Vec<u8>, ViewError> {
        self.view().read(offset, length)
    }
}

impl MemoryHandle for LinearMemory {
    fn byte_len(&self) -> usize {
        let current = read_lock(&self.current);
        // The inner guard borrows `current` and must drop first
        let len = read_lock(&**current).len();
        len
    }

    fn view(&self) -> ByteView {
        ByteView {
            backing: Arc::clone(&*read_lock(&self.current)),
        }
    }
}

impl std::fmt::Debug for LinearMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearMemory")
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_memory_is_zeroed() {
        let memory = LinearMemory::new(16);
        assert_eq!(memory.byte_len(), 16);
        assert_eq!(memory.read(0, 16).unwrap(), vec![0; 16]);
    }

    #[test]
    fn test_with_pages() {
        let memory = LinearMemory::with_pages(2);
        assert_eq!(memory.byte_len(), 2 * PAGE_SIZE);
    }

    #[test]
    fn test_write_then_read() {
        let memory = LinearMemory::new(8);
        memory.write(2, &[1, 2, 3]).unwrap();
        assert_eq!(memory.read(0, 8).unwrap(), vec![0, 0, 1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn test_copy_range_bounds() {
        let memory = LinearMemory::new(8);
        let view = memory.view();
        let mut out = vec![9; 4];

        assert!(view.copy_range(4, 4, &mut out).is_ok());
        assert_eq!(out.len(), 4);

        let err = view.copy_range(5, 4, &mut out).unwrap_err();
        assert_eq!(
            err,
            ViewError::OutOfBounds {
                offset: 5,
                length: 4,
                buffer_len: 8
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_copy_range_offset_overflow() {
        let memory = LinearMemory::new(8);
        let mut out = Vec::new();
        assert!(memory.view().copy_range(usize::MAX, 2, &mut out).is_err());
    }

    #[test]
    fn test_grow_detaches_old_views() {
        let memory = LinearMemory::with_pages(1);
        memory.write(10, &[42]).unwrap();
        let old = memory.view();
        assert_eq!(old.len(), PAGE_SIZE);

        let previous = memory.grow(1);
        assert_eq!(previous, PAGE_SIZE);

        // Old view is permanently detached
        assert!(old.is_empty());
        assert!(old.read(10, 1).is_err());

        // New view sees the preserved contents and the new size
        let fresh = memory.view();
        assert_eq!(fresh.len(), 2 * PAGE_SIZE);
        assert_eq!(fresh.read(10, 1).unwrap(), vec![42]);
        assert!(!fresh.same_buffer(&old));
    }

    #[test]
    fn test_replace_detaches_old_views() {
        let memory = LinearMemory::new(4);
        let old = memory.view();
        memory.replace(vec![7; 6]);
        assert!(old.is_empty());
        assert_eq!(memory.read(0, 6).unwrap(), vec![7; 6]);
    }

    #[test]
    fn test_clones_share_region() {
        let memory = LinearMemory::new(4);
        let other = memory.clone();
        other.write(0, &[5]).unwrap();
        assert_eq!(memory.read(0, 1).unwrap(), vec![5]);

        other.grow(1);
        assert_eq!(memory.byte_len(), 4 + PAGE_SIZE);
    }
}
