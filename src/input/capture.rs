//! Input Actor: Dedicated thread for capturing raw key transitions.
//!
//! This actor runs in its own thread and uses crossterm's event polling
//! to turn terminal key presses and releases into [`KeyEvent`]s without
//! blocking the session loop.

use super::key::{KeyCode, KeyEvent};
use crate::session::HostEvent;
use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyEventKind, KeyModifiers, ModifierKeyCode};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Input actor that polls terminal events.
pub struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl InputActor {
    /// Spawn the input actor thread.
    ///
    /// # Arguments
    ///
    /// * `sender` - Channel to send host events to the session loop.
    /// * `poll_timeout` - How long to wait for events before checking shutdown.
    /// * `synthesize_release` - Follow every press with a release, for
    ///   terminals that cannot report key releases.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn the thread.
    pub fn spawn(
        sender: Sender<HostEvent>,
        poll_timeout: Duration,
        synthesize_release: bool,
    ) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("framebridge-input".to_string())
            .spawn(move || {
                Self::run_loop(&sender, &shutdown_clone, poll_timeout, synthesize_release);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the input thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the input thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main input polling loop.
    fn run_loop(
        sender: &Sender<HostEvent>,
        shutdown: &AtomicBool,
        poll_timeout: Duration,
        synthesize_release: bool,
    ) {
        let mut translator = KeyTranslator::new(synthesize_release);
        loop {
            if shutdown.load(Ordering::Relaxed) {
                let _ = sender.send(HostEvent::Shutdown);
                break;
            }

            match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        for host_event in translator.translate(event) {
                            if sender.send(host_event).is_err() {
                                // Receiver dropped, exit
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = sender.send(HostEvent::Error(e.to_string()));
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    let _ = sender.send(HostEvent::Error(e.to_string()));
                }
            }
        }
    }
}

impl Drop for InputActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Turns crossterm events into host events.
///
/// Remembers whether a Control key is down, because with all keys reported
/// as escape codes Ctrl+C may arrive as a lone Control press followed by a
/// `c` without the modifier bit.
#[derive(Debug, Clone, Default)]
pub struct KeyTranslator {
    synthesize_release: bool,
    ctrl_held: bool,
}

impl KeyTranslator {
    /// Create a translator. With `synthesize_release`, a press is followed
    /// by its release straight away.
    pub const fn new(synthesize_release: bool) -> Self {
        Self {
            synthesize_release,
            ctrl_held: false,
        }
    }

    /// Convert one event into zero or more host events.
    ///
    /// Key repeats never produce events. Ctrl+C becomes [`HostEvent::Quit`].
    pub fn translate(&mut self, event: Event) -> Vec<HostEvent> {
        match event {
            Event::Key(key) => {
                if let event::KeyCode::Modifier(
                    ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl,
                ) = key.code
                {
                    match key.kind {
                        KeyEventKind::Press => self.ctrl_held = true,
                        KeyEventKind::Release => self.ctrl_held = false,
                        KeyEventKind::Repeat => {}
                    }
                    return Vec::new();
                }

                let ctrl = self.ctrl_held || key.modifiers.contains(KeyModifiers::CONTROL);
                if key.kind == KeyEventKind::Press
                    && ctrl
                    && matches!(key.code, event::KeyCode::Char('c' | 'C'))
                {
                    return vec![HostEvent::Quit];
                }

                let Some(code) = convert_key_code(key.code) else {
                    if key.kind == KeyEventKind::Press {
                        log::debug!("no keyboard mapping for {:?}", key.code);
                    }
                    return Vec::new();
                };

                match key.kind {
                    KeyEventKind::Press if self.synthesize_release => vec![
                        HostEvent::Key(KeyEvent::press(code)),
                        HostEvent::Key(KeyEvent::release(code)),
                    ],
                    KeyEventKind::Press => vec![HostEvent::Key(KeyEvent::press(code))],
                    KeyEventKind::Release => vec![HostEvent::Key(KeyEvent::release(code))],
                    KeyEventKind::Repeat => Vec::new(),
                }
            }

            Event::Resize(cols, rows) => vec![HostEvent::Resize { cols, rows }],

            // Focus loss swallows the Control release
            Event::FocusLost => {
                self.ctrl_held = false;
                Vec::new()
            }

            _ => Vec::new(),
        }
    }
}

/// Stateless conversion of a single event.
///
/// Same as a fresh [`KeyTranslator`]; Ctrl+C is only recognised from the
/// modifier bit.
pub fn convert_event(event: Event, synthesize_release: bool) -> Vec<HostEvent> {
    KeyTranslator::new(synthesize_release).translate(event)
}

/// Convert a crossterm key code to a keyboard key.
///
/// Returns `None` for keys the simulated keyboard does not have.
pub fn convert_key_code(code: event::KeyCode) -> Option<KeyCode> {
    match code {
        event::KeyCode::Char(c) => KeyCode::from_char(c),
        event::KeyCode::F(n) => KeyCode::function(n),
        event::KeyCode::Backspace => Some(KeyCode::Backspace),
        event::KeyCode::Enter => Some(KeyCode::Enter),
        event::KeyCode::Left => Some(KeyCode::ArrowLeft),
        event::KeyCode::Right => Some(KeyCode::ArrowRight),
        event::KeyCode::Up => Some(KeyCode::ArrowUp),
        event::KeyCode::Down => Some(KeyCode::ArrowDown),
        event::KeyCode::Modifier(modifier) => match modifier {
            ModifierKeyCode::LeftShift => Some(KeyCode::ShiftLeft),
            ModifierKeyCode::LeftSuper | ModifierKeyCode::LeftMeta => Some(KeyCode::MetaLeft),
            ModifierKeyCode::RightSuper | ModifierKeyCode::RightMeta => Some(KeyCode::MetaRight),
            ModifierKeyCode::RightAlt => Some(KeyCode::AltRight),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent as TermKeyEvent, KeyEventState};

    fn term_key(code: event::KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> Event {
        Event::Key(TermKeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_press_and_release() {
        let press = term_key(event::KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Press);
        let release = term_key(event::KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);

        assert_eq!(
            convert_event(press, false),
            vec![HostEvent::Key(KeyEvent::press(KeyCode::KeyQ))]
        );
        assert_eq!(
            convert_event(release, false),
            vec![HostEvent::Key(KeyEvent::release(KeyCode::KeyQ))]
        );
    }

    #[test]
    fn test_repeat_is_dropped() {
        let repeat = term_key(event::KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Repeat);
        assert!(convert_event(repeat, false).is_empty());
    }

    #[test]
    fn test_synthesized_release() {
        let press = term_key(event::KeyCode::F(7), KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(
            convert_event(press, true),
            vec![
                HostEvent::Key(KeyEvent::press(KeyCode::F7)),
                HostEvent::Key(KeyEvent::release(KeyCode::F7)),
            ]
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = term_key(event::KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(convert_event(ctrl_c, true), vec![HostEvent::Quit]);
    }

    #[test]
    fn test_ctrl_c_as_separate_key_events_quits() {
        let mut translator = KeyTranslator::new(false);
        let ctrl = event::KeyCode::Modifier(ModifierKeyCode::LeftControl);

        assert!(translator
            .translate(term_key(ctrl, KeyModifiers::NONE, KeyEventKind::Press))
            .is_empty());
        assert_eq!(
            translator.translate(term_key(event::KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Press)),
            vec![HostEvent::Quit]
        );

        // Once Control is up, `c` is an ordinary key again
        assert!(translator
            .translate(term_key(ctrl, KeyModifiers::NONE, KeyEventKind::Release))
            .is_empty());
        assert_eq!(
            translator.translate(term_key(event::KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Press)),
            vec![HostEvent::Key(KeyEvent::press(KeyCode::KeyC))]
        );
    }

    #[test]
    fn test_lone_modifier_keys_are_relayed() {
        let mut translator = KeyTranslator::new(false);
        let alt_gr = event::KeyCode::Modifier(ModifierKeyCode::RightAlt);
        assert_eq!(
            translator.translate(term_key(alt_gr, KeyModifiers::ALT, KeyEventKind::Press)),
            vec![HostEvent::Key(KeyEvent::press(KeyCode::AltRight))]
        );
        assert_eq!(
            translator.translate(term_key(alt_gr, KeyModifiers::NONE, KeyEventKind::Release)),
            vec![HostEvent::Key(KeyEvent::release(KeyCode::AltRight))]
        );
    }

    #[test]
    fn test_shifted_symbol_reaches_physical_key() {
        let bang = term_key(event::KeyCode::Char('!'), KeyModifiers::SHIFT, KeyEventKind::Press);
        assert_eq!(
            convert_event(bang, false),
            vec![HostEvent::Key(KeyEvent::press(KeyCode::Digit1))]
        );
    }

    #[test]
    fn test_unmapped_key_dropped() {
        let esc = term_key(event::KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Press);
        assert!(convert_event(esc, true).is_empty());
    }

    #[test]
    fn test_resize() {
        assert_eq!(
            convert_event(Event::Resize(100, 40), false),
            vec![HostEvent::Resize { cols: 100, rows: 40 }]
        );
    }

    #[test]
    fn test_convert_modifier_keys() {
        assert_eq!(
            convert_key_code(event::KeyCode::Modifier(ModifierKeyCode::RightAlt)),
            Some(KeyCode::AltRight)
        );
        assert_eq!(
            convert_key_code(event::KeyCode::Modifier(ModifierKeyCode::LeftShift)),
            Some(KeyCode::ShiftLeft)
        );
        assert_eq!(convert_key_code(event::KeyCode::Tab), None);
    }
}
