//! Cross-thread control of a running session.

use super::messages::Command;
use crate::input::{InputChannel, KeyCode, KeyEvent, KeyParseError};
use crate::sequencer::{SequenceHandle, SequencerError};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How often a waiting request rechecks that the loop is still serving.
const REPLY_POLL: Duration = Duration::from_millis(20);

/// Keys played by [`Automation::smoke_test`].
pub const SMOKE_TEST_KEYS: [KeyCode; 2] = [KeyCode::F7, KeyCode::AltRight];

/// Errors from automation requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutomationError {
    /// The sequencer refused the request.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    /// A key name did not validate.
    #[error(transparent)]
    Key(#[from] KeyParseError),

    /// The session loop is gone.
    #[error("session is not running")]
    Disconnected,
}

/// Cloneable handle for driving a session from other threads.
///
/// Requests are queued to the session loop and take effect at its next
/// iteration. [`run_sequence`](Self::run_sequence) waits for the loop to
/// accept or refuse the sequence, so it must not be called from the thread
/// running the loop.
#[derive(Debug, Clone)]
pub struct Automation {
    commands: Sender<Command>,
    channel: InputChannel,
    /// Cleared when the loop stops serving commands.
    serving: Arc<AtomicBool>,
}

impl Automation {
    pub(crate) const fn new(
        commands: Sender<Command>,
        channel: InputChannel,
        serving: Arc<AtomicBool>,
    ) -> Self {
        Self {
            commands,
            channel,
            serving,
        }
    }

    /// Check whether the session loop still takes requests.
    pub fn is_connected(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }

    /// Play `keys` as timed press/release pairs.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Sequencer`] if a sequence is already
    /// running, or [`AutomationError::Disconnected`] if the session ended.
    pub fn run_sequence(&self, keys: Vec<KeyCode>) -> Result<SequenceHandle, AutomationError> {
        let (reply, outcome) = bounded(1);
        self.send(Command::RunSequence { keys, reply })?;
        loop {
            match outcome.recv_timeout(REPLY_POLL) {
                Ok(result) => return Ok(result?),
                Err(RecvTimeoutError::Disconnected) => return Err(AutomationError::Disconnected),
                // The loop may have stopped after our request was queued
                Err(RecvTimeoutError::Timeout) if !self.is_connected() => {
                    return outcome
                        .try_recv()
                        .map_err(|_| AutomationError::Disconnected)?
                        .map_err(AutomationError::from);
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// Like [`run_sequence`](Self::run_sequence), with DOM-style key names.
    ///
    /// Every name is validated before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Key`] for an unknown name, otherwise as
    /// [`run_sequence`](Self::run_sequence).
    pub fn run_sequence_names(&self, names: &[&str]) -> Result<SequenceHandle, AutomationError> {
        let keys = names
            .iter()
            .map(|name| name.parse::<KeyCode>())
            .collect::<Result<Vec<_>, _>>()?;
        self.run_sequence(keys)
    }

    /// Play the smoke-test sequence.
    ///
    /// # Errors
    ///
    /// As [`run_sequence`](Self::run_sequence).
    pub fn smoke_test(&self) -> Result<SequenceHandle, AutomationError> {
        self.run_sequence(SMOKE_TEST_KEYS.to_vec())
    }

    /// Cancel the running sequence, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Disconnected`] if the session ended.
    pub fn cancel(&self) -> Result<(), AutomationError> {
        self.send(Command::Cancel)
    }

    /// Ask the session loop to stop.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Disconnected`] if the session ended.
    pub fn shutdown(&self) -> Result<(), AutomationError> {
        self.send(Command::Shutdown)
    }

    /// Events buffered for the module, without consuming them.
    pub fn buffered_events(&self) -> Vec<KeyEvent> {
        self.channel.snapshot()
    }

    fn send(&self, command: Command) -> Result<(), AutomationError> {
        if !self.is_connected() {
            return Err(AutomationError::Disconnected);
        }
        self.commands
            .send(command)
            .map_err(|_| AutomationError::Disconnected)
    }
}
