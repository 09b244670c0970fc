//! Scripted input: timed key sequences for demos and automated runs.
//!
//! # Automaton
//!
//! ```text
//!            start(keys)              hold elapsed
//!  Idle/Done ──────────▶ Holding ──────────────────▶ Resting
//!      ▲                    ▲                           │
//!      │                    └───── rest elapsed, ───────┤
//!      │                           keys left            │
//!      └────────────── rest elapsed, list empty ────────┘
//! ```
//!
//! Every press is pushed into the session's
//! [`InputChannel`](crate::input::InputChannel) and every release follows
//! its press, so scripted input is indistinguishable from real input.

mod automaton;
mod timer;

pub use automaton::{
    Phase, SequenceHandle, Sequencer, SequencerError, SequencerTiming, DEFAULT_HOLD, DEFAULT_REST,
};
pub use timer::{CancelToken, Timer, TimerState};
