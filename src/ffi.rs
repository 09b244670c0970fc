//! C Foreign Function Interface (FFI) for Framebridge.
//!
//! Lets a foreign host (a browser shim, a C emulator front end) reuse the
//! ordered input channel, the scripted sequencer and the checked frame copy
//! without the Rust session loop. All functions are `extern "C"` with
//! stable ABI.
//!
//! # Safety
//!
//! All functions that accept pointers require valid pointers or NULL.
//! The caller is responsible for proper memory management of handles.
//!
//! # Example (C)
//!
//! ```c
//! #include "framebridge.h"
//!
//! int main() {
//!     FramebridgeInput* input = framebridge_input_new();
//!     if (!input) return 1;
//!
//!     framebridge_input_smoke_test(input);
//!     while (framebridge_input_pump(input) >= 0) {
//!         FramebridgeKeyEvent event;
//!         while (framebridge_input_pop(input, &event)) {
//!             machine_key(event.scan_code, event.down);
//!         }
//!         sleep_ms(10);
//!     }
//!
//!     framebridge_input_destroy(input);
//!     return 0;
//! }
//! ```

// FFI modules intentionally use unsafe and no_mangle
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use crate::input::{InputChannel, KeyCode, KeyEvent};
use crate::render::{FrameDescriptor, FrameError};
use crate::sequencer::{Sequencer, SequencerError, SequencerTiming};
use crate::session::SMOKE_TEST_KEYS;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;
use std::slice;
use std::time::Instant;

// =============================================================================
// Opaque Handle Types
// =============================================================================

/// Opaque handle to an input channel and its sequencer.
pub struct FramebridgeInput {
    channel: InputChannel,
    sequencer: Sequencer,
}

// =============================================================================
// Result and Error Codes
// =============================================================================

/// Result codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebridgeResult {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer passed.
    NullPointer = 1,
    /// Invalid UTF-8 string.
    InvalidUtf8 = 2,
    /// Key name is not on the keyboard.
    UnknownKey = 3,
    /// Frame geometry does not match its length.
    InvalidFrame = 4,
    /// Range exceeds the buffer.
    OutOfBounds = 5,
    /// A sequence is already running.
    Busy = 6,
}

impl From<SequencerError> for FramebridgeResult {
    fn from(err: SequencerError) -> Self {
        match err {
            SequencerError::Busy => Self::Busy,
        }
    }
}

impl From<FrameError> for FramebridgeResult {
    fn from(_: FrameError) -> Self {
        Self::InvalidFrame
    }
}

/// A key transition handed to the foreign host.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebridgeKeyEvent {
    /// Keyboard matrix scan code, `col << 4 | row`.
    pub scan_code: u8,
    /// `true` for a press.
    pub down: bool,
}

impl From<KeyEvent> for FramebridgeKeyEvent {
    fn from(event: KeyEvent) -> Self {
        Self {
            scan_code: event.code.matrix_position().scan_code(),
            down: event.down,
        }
    }
}

// =============================================================================
// Input Functions
// =============================================================================

/// Create an input channel with the default sequencer timing.
#[unsafe(no_mangle)]
pub extern "C" fn framebridge_input_new() -> *mut FramebridgeInput {
    framebridge_input_with_timing(0, 0)
}

/// Create an input channel with custom hold/rest times in milliseconds.
///
/// A zero hold time selects the default timing.
#[unsafe(no_mangle)]
pub extern "C" fn framebridge_input_with_timing(hold_ms: u32, rest_ms: u32) -> *mut FramebridgeInput {
    let timing = if hold_ms == 0 {
        SequencerTiming::default()
    } else {
        SequencerTiming {
            hold: std::time::Duration::from_millis(u64::from(hold_ms)),
            rest: std::time::Duration::from_millis(u64::from(rest_ms)),
        }
    };
    let channel = InputChannel::new();
    let sequencer = Sequencer::new(channel.clone(), timing);
    Box::into_raw(Box::new(FramebridgeInput { channel, sequencer }))
}

/// Destroy an input handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_destroy(input: *mut FramebridgeInput) {
    if !input.is_null() {
        drop(Box::from_raw(input));
    }
}

/// Append a key transition named by its DOM code (e.g. `"KeyQ"`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_push(
    input: *const FramebridgeInput,
    code: *const c_char,
    down: bool,
) -> FramebridgeResult {
    if input.is_null() {
        return FramebridgeResult::NullPointer;
    }
    match parse_key(code) {
        Ok(code) => {
            (*input).channel.push(KeyEvent { code, down });
            FramebridgeResult::Ok
        }
        Err(result) => result,
    }
}

/// Number of buffered events.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_len(input: *const FramebridgeInput) -> usize {
    if input.is_null() {
        return 0;
    }
    (*input).channel.len()
}

/// Take the oldest buffered event.
///
/// Returns `false` if nothing was buffered.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_pop(
    input: *const FramebridgeInput,
    event_out: *mut FramebridgeKeyEvent,
) -> bool {
    if input.is_null() || event_out.is_null() {
        return false;
    }
    match (*input).channel.pop() {
        Some(event) => {
            *event_out = event.into();
            true
        }
        None => false,
    }
}

/// Start a scripted sequence of `count` key names.
///
/// All names are validated before the sequence starts.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_run_sequence(
    input: *mut FramebridgeInput,
    codes: *const *const c_char,
    count: usize,
) -> FramebridgeResult {
    if input.is_null() || (codes.is_null() && count > 0) {
        return FramebridgeResult::NullPointer;
    }
    let names: &[*const c_char] = if count == 0 {
        &[]
    } else {
        slice::from_raw_parts(codes, count)
    };

    let mut keys = Vec::with_capacity(count);
    for &name in names {
        match parse_key(name) {
            Ok(key) => keys.push(key),
            Err(result) => return result,
        }
    }
    start(&mut *input, keys)
}

/// Play the smoke-test sequence (`F7`, `AltRight`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_smoke_test(input: *mut FramebridgeInput) -> FramebridgeResult {
    if input.is_null() {
        return FramebridgeResult::NullPointer;
    }
    start(&mut *input, SMOKE_TEST_KEYS.to_vec())
}

/// Fire due sequencer transitions.
///
/// Returns milliseconds until the next transition, or -1 when no sequence
/// is running. Call again after that delay; calling early is harmless.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_pump(input: *mut FramebridgeInput) -> i64 {
    if input.is_null() {
        return -1;
    }
    let now = Instant::now();
    match (*input).sequencer.poll(now) {
        Some(deadline) => {
            let wait = deadline.saturating_duration_since(now);
            // Round up so the caller never wakes before the deadline
            i64::try_from(wait.as_micros().div_ceil(1000)).unwrap_or(i64::MAX)
        }
        None => -1,
    }
}

/// Cancel the running sequence, releasing a held key.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_input_cancel(input: *mut FramebridgeInput) -> FramebridgeResult {
    if input.is_null() {
        return FramebridgeResult::NullPointer;
    }
    let input = &mut *input;
    if input.sequencer.cancel() {
        input.sequencer.poll(Instant::now());
    }
    FramebridgeResult::Ok
}

// =============================================================================
// Frame Functions
// =============================================================================

/// Copy one RGBA frame out of a module memory buffer.
///
/// Validates `length == width * height * 4` and that the range fits in
/// `memory_len`, then copies the frame into `out` in a single pass. Nothing
/// is written to `out` on failure.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn framebridge_frame_copy(
    memory: *const u8,
    memory_len: usize,
    offset: usize,
    length: usize,
    width: u32,
    height: u32,
    out: *mut u8,
    out_len: usize,
) -> FramebridgeResult {
    if memory.is_null() || out.is_null() {
        return FramebridgeResult::NullPointer;
    }
    let descriptor = match FrameDescriptor::new(offset, length, width, height) {
        Ok(descriptor) => descriptor,
        Err(err) => return err.into(),
    };
    if out_len < descriptor.length() {
        return FramebridgeResult::OutOfBounds;
    }

    let memory = slice::from_raw_parts(memory, memory_len);
    let Some(source) = descriptor
        .offset()
        .checked_add(descriptor.length())
        .and_then(|end| memory.get(descriptor.offset()..end))
    else {
        return FramebridgeResult::OutOfBounds;
    };

    ptr::copy_nonoverlapping(source.as_ptr(), out, source.len());
    FramebridgeResult::Ok
}

// =============================================================================
// Version Information
// =============================================================================

/// Get the Framebridge version string.
#[unsafe(no_mangle)]
pub extern "C" fn framebridge_version() -> *const c_char {
    static VERSION: &[u8] = b"0.1.0\0";
    VERSION.as_ptr().cast::<c_char>()
}

// =============================================================================
// Helper Functions
// =============================================================================

unsafe fn parse_key(code: *const c_char) -> Result<KeyCode, FramebridgeResult> {
    if code.is_null() {
        return Err(FramebridgeResult::NullPointer);
    }
    let name = CStr::from_ptr(code)
        .to_str()
        .map_err(|_| FramebridgeResult::InvalidUtf8)?;
    name.parse().map_err(|_| FramebridgeResult::UnknownKey)
}

fn start(input: &mut FramebridgeInput, keys: Vec<KeyCode>) -> FramebridgeResult {
    match input.sequencer.start(keys, Instant::now()) {
        Ok(_) => FramebridgeResult::Ok,
        Err(err) => err.into(),
    }
}
