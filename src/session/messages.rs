//! Message types for actor communication.
//!
//! These enums define the protocol between the helper threads, automation
//! handles and the session loop.

use crate::input::{KeyCode, KeyEvent};
use crate::sequencer::{SequenceHandle, SequencerError};
use crossbeam_channel::Sender;

/// Events from the input thread.
///
/// These are sent from the input actor to the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A key changed state.
    Key(KeyEvent),

    /// Terminal was resized.
    Resize {
        /// New width in columns.
        cols: u16,
        /// New height in rows.
        rows: u16,
    },

    /// The operator asked to quit (Ctrl+C).
    Quit,

    /// Input thread encountered an error.
    Error(String),

    /// Input thread is shutting down.
    Shutdown,
}

/// Requests from [`Automation`](super::Automation) handles.
#[derive(Debug)]
pub enum Command {
    /// Start a scripted key sequence.
    RunSequence {
        /// Keys to play, in order.
        keys: Vec<KeyCode>,
        /// Where the outcome of the start request goes.
        reply: Sender<Result<SequenceHandle, SequencerError>>,
    },

    /// Cancel the sequence in flight, if any.
    Cancel,

    /// Stop the session loop.
    Shutdown,
}
