//! Frame pacing on its own thread.
//!
//! The session steps the module once per [`Tick`]. Keeping the clock on a
//! separate thread lets input and automation wake the loop between frames
//! without shifting the frame schedule.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// One frame deadline reached.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Sequence number of the tick, starting at zero.
    pub frame: u64,
    /// Time since the pacer started.
    pub elapsed: Duration,
}

/// Owns the pacing thread.
///
/// Stopping works by dropping the stop sender: the thread sleeps in
/// `recv_timeout` on the other end and wakes up disconnected.
pub struct TickerActor {
    handle: Option<JoinHandle<()>>,
    stop: Option<Sender<()>>,
    ticks: Receiver<Tick>,
}

impl TickerActor {
    /// Start emitting a tick every `interval`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(interval: Duration) -> io::Result<Self> {
        let (stop, stopped) = bounded::<()>(0);
        // At most two pending: a slow loop skips frames instead of bursting
        let (tick_tx, ticks) = bounded(2);

        let handle = thread::Builder::new()
            .name("framebridge-ticker".to_string())
            .spawn(move || pace(&tick_tx, &stopped, interval))?;

        Ok(Self {
            handle: Some(handle),
            stop: Some(stop),
            ticks,
        })
    }

    /// Tick receiver, for `select!`.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Tick> {
        &self.ticks
    }

    /// Ask the thread to stop without waiting for it.
    pub fn shutdown(&mut self) {
        self.stop = None;
    }

    /// Stop the thread and wait for it.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn pace(ticks: &Sender<Tick>, stopped: &Receiver<()>, interval: Duration) {
    let start = Instant::now();
    let mut deadline = start + interval;

    for frame in 0u64.. {
        let wait = deadline.saturating_duration_since(Instant::now());
        if !matches!(stopped.recv_timeout(wait), Err(RecvTimeoutError::Timeout)) {
            return;
        }

        let now = Instant::now();
        // Full buffer: the loop is behind, so this frame is dropped
        let _ = ticks.try_send(Tick {
            frame,
            elapsed: now - start,
        });

        deadline += interval;
        if deadline < now {
            deadline = now + interval;
        }
    }
}

impl Drop for TickerActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
