//! Terminal mode setup and restore.

use crossterm::{
    cursor,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;

/// Progressive keyboard enhancements requested from the terminal.
///
/// Release events need `REPORT_EVENT_TYPES`. Lone modifier keys (Shift,
/// Meta, AltGr) are only reported as keys with all keys sent as escape
/// codes, which in turn needs disambiguation.
pub const KEYBOARD_FLAGS: KeyboardEnhancementFlags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
    .union(KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES)
    .union(KeyboardEnhancementFlags::REPORT_EVENT_TYPES);

/// Puts the terminal into raw mode for the lifetime of the guard.
///
/// Dropping the guard restores the terminal, also when setup failed half
/// way through.
#[derive(Debug)]
pub struct TerminalGuard {
    alternate_screen: bool,
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    /// Enter raw mode, hide the cursor and ask for [`KEYBOARD_FLAGS`].
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup fails.
    pub fn enter(alternate_screen: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut guard = Self {
            alternate_screen: false,
            keyboard_enhanced: false,
        };

        let mut stdout = io::stdout();
        if alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
            guard.alternate_screen = true;
        }
        execute!(stdout, cursor::Hide)?;

        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(stdout, PushKeyboardEnhancementFlags(KEYBOARD_FLAGS))?;
            guard.keyboard_enhanced = true;
        }
        log::info!(
            "terminal ready (alternate_screen={}, key_releases={})",
            guard.alternate_screen,
            guard.keyboard_enhanced
        );

        Ok(guard)
    }

    /// Whether the terminal reports key releases.
    pub const fn reports_releases(&self) -> bool {
        self.keyboard_enhanced
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.keyboard_enhanced {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout, cursor::Show);
        if self.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
    }
}
