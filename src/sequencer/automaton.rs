//! The scripted input automaton.

use super::timer::{CancelToken, Timer, TimerState};
use crate::input::{InputChannel, KeyCode, KeyEvent};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default time a key is held down.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(300);

/// Default pause between releasing a key and pressing the next.
pub const DEFAULT_REST: Duration = Duration::from_millis(100);

/// Errors from starting a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequencerError {
    /// A sequence is already in flight.
    #[error("a key sequence is already running")]
    Busy,
}

/// Phase of the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been played yet.
    Idle,
    /// A key is down, waiting for the hold to elapse.
    Holding,
    /// A key was released, waiting for the rest to elapse.
    Resting,
    /// The last sequence finished or was cancelled.
    Done,
}

/// Hold and rest durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerTiming {
    /// How long each key stays down.
    pub hold: Duration,
    /// Pause after each release.
    pub rest: Duration,
}

impl Default for SequencerTiming {
    fn default() -> Self {
        Self {
            hold: DEFAULT_HOLD,
            rest: DEFAULT_REST,
        }
    }
}

/// Handle to a started sequence.
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    id: u64,
    token: CancelToken,
}

impl SequenceHandle {
    /// Sequence number, unique per sequencer.
    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Stop the sequence at its next poll.
    ///
    /// A key that is down at that point is released first.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether the sequence was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Plays key lists into an [`InputChannel`] as timed down/up pairs.
///
/// One sequence at a time: `Idle/Done -> Holding -> Resting -> ... -> Done`.
/// The sequencer never blocks; the owner calls [`poll`](Self::poll) with the
/// current time and gets back the next deadline to wait for.
#[derive(Debug)]
pub struct Sequencer {
    channel: InputChannel,
    timing: SequencerTiming,
    phase: Phase,
    remaining: VecDeque<KeyCode>,
    current: Option<KeyCode>,
    timer: Option<Timer>,
    token: CancelToken,
    next_id: u64,
}

impl Sequencer {
    /// Create an idle sequencer writing into `channel`.
    pub fn new(channel: InputChannel, timing: SequencerTiming) -> Self {
        Self {
            channel,
            timing,
            phase: Phase::Idle,
            remaining: VecDeque::new(),
            current: None,
            timer: None,
            token: CancelToken::new(),
            next_id: 0,
        }
    }

    /// Start playing `keys`.
    ///
    /// The first key goes down immediately. An empty list finishes at once
    /// without producing events.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Busy`] while another sequence is in flight.
    pub fn start<I>(&mut self, keys: I, now: Instant) -> Result<SequenceHandle, SequencerError>
    where
        I: IntoIterator<Item = KeyCode>,
    {
        if self.is_running() {
            return Err(SequencerError::Busy);
        }

        self.next_id += 1;
        self.token = CancelToken::new();
        self.remaining = keys.into_iter().collect();
        log::info!(
            "sequence #{} started with {} keys",
            self.next_id,
            self.remaining.len()
        );

        self.press_next(now);

        Ok(SequenceHandle {
            id: self.next_id,
            token: self.token.clone(),
        })
    }

    /// Fire every transition due at `now`.
    ///
    /// Returns the next deadline, or `None` when no sequence is in flight.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        loop {
            let state = self.timer.as_ref()?.poll(now);
            match state {
                TimerState::Pending(_) => return self.next_deadline(),
                TimerState::Cancelled => {
                    self.abort();
                    return None;
                }
                TimerState::Fired => self.advance(now),
            }
        }
    }

    /// Cancel the sequence in flight.
    ///
    /// Takes effect at the next [`poll`](Self::poll). Returns `false` if
    /// nothing was running.
    pub fn cancel(&self) -> bool {
        if self.is_running() {
            self.token.cancel();
            true
        } else {
            false
        }
    }

    /// Check whether a sequence is in flight.
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Holding | Phase::Resting)
    }

    /// Current phase.
    #[inline]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Keys not yet pressed.
    pub fn remaining(&self) -> impl ExactSizeIterator<Item = KeyCode> + '_ {
        self.remaining.iter().copied()
    }

    /// The key currently down, if any.
    #[inline]
    pub const fn held_key(&self) -> Option<KeyCode> {
        match self.phase {
            Phase::Holding => self.current,
            _ => None,
        }
    }

    /// Deadline of the armed timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(Timer::deadline)
    }

    /// Hold and rest durations.
    #[inline]
    pub const fn timing(&self) -> SequencerTiming {
        self.timing
    }

    /// The channel this sequencer writes to.
    #[inline]
    pub const fn channel(&self) -> &InputChannel {
        &self.channel
    }

    fn advance(&mut self, now: Instant) {
        match self.phase {
            Phase::Holding => {
                if let Some(key) = self.current {
                    self.channel.push(KeyEvent::release(key));
                    log::debug!("sequence #{}: released {key}", self.next_id);
                }
                self.phase = Phase::Resting;
                self.arm(now, self.timing.rest);
            }
            Phase::Resting => self.press_next(now),
            Phase::Idle | Phase::Done => self.timer = None,
        }
    }

    fn press_next(&mut self, now: Instant) {
        if let Some(key) = self.remaining.pop_front() {
            self.channel.push(KeyEvent::press(key));
            log::debug!("sequence #{}: pressed {key}", self.next_id);
            self.current = Some(key);
            self.phase = Phase::Holding;
            self.arm(now, self.timing.hold);
        } else {
            self.finish();
        }
    }

    fn arm(&mut self, now: Instant, delay: Duration) {
        self.timer = Some(Timer::after(now, delay, self.token.clone()));
    }

    fn abort(&mut self) {
        if let Some(key) = self.held_key() {
            self.channel.push(KeyEvent::release(key));
        }
        log::info!(
            "sequence #{} cancelled with {} keys left",
            self.next_id,
            self.remaining.len()
        );
        self.remaining.clear();
        self.phase = Phase::Done;
        self.current = None;
        self.timer = None;
    }

    fn finish(&mut self) {
        log::info!("sequence #{} done", self.next_id);
        self.phase = Phase::Done;
        self.current = None;
        self.timer = None;
    }
}
