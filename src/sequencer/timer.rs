//! Cancellable one-shot timers.
//!
//! Timers never sleep. The owner polls them with the current time and waits
//! on the reported deadline however it likes (a `select!` timeout, a
//! frame tick, a foreign host's event loop).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a token handed to another thread can
/// invalidate timers owned by the session loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every timer armed with this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether [`cancel`](Self::cancel) was called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result of polling a [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// The deadline is still ahead by this much.
    Pending(Duration),
    /// The deadline has passed.
    Fired,
    /// The timer's token was cancelled before it fired.
    Cancelled,
}

/// A deadline guarded by a [`CancelToken`].
#[derive(Debug, Clone)]
pub struct Timer {
    deadline: Instant,
    token: CancelToken,
}

impl Timer {
    /// Arm a timer firing `delay` after `now`.
    pub fn after(now: Instant, delay: Duration, token: CancelToken) -> Self {
        Self {
            deadline: now + delay,
            token,
        }
    }

    /// When the timer fires.
    #[inline]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Check the timer against `now`.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn poll(&self, now: Instant) -> TimerState {
        if self.token.is_cancelled() {
            TimerState::Cancelled
        } else if now >= self.deadline {
            TimerState::Fired
        } else {
            TimerState::Pending(self.deadline - now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_pending_then_fired() {
        let start = Instant::now();
        let timer = Timer::after(start, Duration::from_millis(300), CancelToken::new());

        assert_eq!(
            timer.poll(start + Duration::from_millis(100)),
            TimerState::Pending(Duration::from_millis(200))
        );
        assert_eq!(timer.poll(start + Duration::from_millis(300)), TimerState::Fired);
        assert_eq!(timer.poll(start + Duration::from_secs(5)), TimerState::Fired);
    }

    #[test]
    fn test_cancel_beats_deadline() {
        let start = Instant::now();
        let token = CancelToken::new();
        let timer = Timer::after(start, Duration::from_millis(10), token.clone());

        token.cancel();
        assert_eq!(timer.poll(start + Duration::from_secs(1)), TimerState::Cancelled);
    }

    #[test]
    fn test_token_clones_share_flag() {
        let token = CancelToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());

        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
