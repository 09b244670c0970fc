//! `InputChannel`: The ordered queue between key producers and the module.

use super::key::KeyEvent;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An ordered, unbounded queue of key transitions.
///
/// Every producer (raw input capture, the scripted sequencer, foreign
/// hosts through the C API) appends to the same queue, and the module drains
/// it on its own schedule. The channel relays events literally: nothing is
/// deduplicated, coalesced or reordered, so two presses of the same key
/// without a release in between both reach the module.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct InputChannel {
    events: Arc<Mutex<VecDeque<KeyEvent>>>,
}

impl InputChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<KeyEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event to the tail.
    #[inline]
    pub fn push(&self, event: KeyEvent) {
        self.lock().push_back(event);
    }

    /// Remove and return every buffered event, oldest first.
    pub fn drain(&self) -> Vec<KeyEvent> {
        self.lock().drain(..).collect()
    }

    /// Remove and return the oldest buffered event.
    #[inline]
    pub fn pop(&self) -> Option<KeyEvent> {
        self.lock().pop_front()
    }

    /// Copy the buffered events without consuming them.
    pub fn snapshot(&self) -> Vec<KeyEvent> {
        self.lock().iter().copied().collect()
    }

    /// Number of buffered events.
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl std::fmt::Debug for InputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;
    use std::thread;

    #[test]
    fn test_push_drain_preserves_order() {
        let channel = InputChannel::new();
        let sequence = [
            KeyEvent::press(KeyCode::KeyA),
            KeyEvent::press(KeyCode::KeyB),
            KeyEvent::release(KeyCode::KeyA),
            KeyEvent::release(KeyCode::KeyB),
        ];
        for event in sequence {
            channel.push(event);
        }

        assert_eq!(channel.drain(), sequence.to_vec());
        assert!(channel.is_empty());
    }

    #[test]
    fn test_duplicate_presses_are_kept() {
        let channel = InputChannel::new();
        channel.push(KeyEvent::press(KeyCode::Space));
        channel.push(KeyEvent::press(KeyCode::Space));
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn test_pop_is_fifo() {
        let channel = InputChannel::new();
        channel.push(KeyEvent::press(KeyCode::F1));
        channel.push(KeyEvent::release(KeyCode::F1));

        assert_eq!(channel.pop(), Some(KeyEvent::press(KeyCode::F1)));
        assert_eq!(channel.pop(), Some(KeyEvent::release(KeyCode::F1)));
        assert_eq!(channel.pop(), None);
    }

    #[test]
    fn test_snapshot_does_not_consume() {
        let channel = InputChannel::new();
        channel.push(KeyEvent::press(KeyCode::Enter));
        assert_eq!(channel.snapshot(), vec![KeyEvent::press(KeyCode::Enter)]);
        assert_eq!(channel.len(), 1);
    }

    #[test]
    fn test_clones_share_queue_across_threads() {
        let channel = InputChannel::new();
        let producer = channel.clone();

        let handle = thread::spawn(move || {
            for key in [KeyCode::KeyQ, KeyCode::KeyW, KeyCode::KeyE] {
                producer.push(KeyEvent::press(key));
            }
        });
        handle.join().unwrap();

        let codes: Vec<_> = channel.drain().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![KeyCode::KeyQ, KeyCode::KeyW, KeyCode::KeyE]);
    }
}
