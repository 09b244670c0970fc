//! Key codes and key events.
//!
//! The key set is closed: it is exactly the keyboard of the simulated
//! machine, a 12x6 matrix. Key names follow DOM `KeyboardEvent.code` values
//! so scripts written against a browser host keep working.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A key name that is not part of the keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// The name does not match any key.
    #[error("unknown key code `{0}`")]
    Unknown(String),
    /// A key list contained an empty entry.
    #[error("empty key code in list")]
    Empty,
}

/// Position of a key in the keyboard matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixPosition {
    /// Row, 0 (bottom) to 5 (function keys).
    pub row: u8,
    /// Column, 0 (right) to 11 (left).
    pub col: u8,
}

impl MatrixPosition {
    /// Number of matrix rows.
    pub const ROWS: usize = 6;
    /// Number of matrix columns.
    pub const COLS: usize = 12;

    /// Pack as `col << 4 | row`, the scan code the machine's keyboard uses.
    #[inline]
    pub const fn scan_code(self) -> u8 {
        (self.col & 0x0F) << 4 | (self.row & 0x0F)
    }
}

macro_rules! key_codes {
    ($($variant:ident => ($row:expr, $col:expr)),* $(,)?) => {
        /// A symbolic key of the simulated keyboard.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum KeyCode {
            $(
                #[doc = concat!("The `", stringify!($variant), "` key.")]
                $variant,
            )*
        }

        impl KeyCode {
            /// Every key, in matrix order (function row first).
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// The key's DOM-style name, e.g. `"KeyQ"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }

            /// The key's position in the keyboard matrix.
            pub const fn matrix_position(self) -> MatrixPosition {
                match self {
                    $(Self::$variant => MatrixPosition { row: $row, col: $col },)*
                }
            }
        }

        impl FromStr for KeyCode {
            type Err = KeyParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)*
                    "" => Err(KeyParseError::Empty),
                    other => Err(KeyParseError::Unknown(other.to_string())),
                }
            }
        }
    };
}

key_codes! {
    F1 => (5, 11), F2 => (5, 10), F3 => (5, 9), F4 => (5, 8),
    F5 => (5, 7), F6 => (5, 6), F7 => (5, 5), F8 => (5, 4),
    F9 => (5, 3), F10 => (5, 2), F11 => (5, 1), F12 => (5, 0),

    IntlBackslash => (4, 11), Digit1 => (4, 10), Digit2 => (4, 9), Digit3 => (4, 8),
    Digit4 => (4, 7), Digit5 => (4, 6), Digit6 => (4, 5), Digit7 => (4, 4),
    Digit8 => (4, 3), Digit9 => (4, 2), Digit0 => (4, 1), Equal => (4, 0),

    KeyQ => (3, 11), KeyW => (3, 10), KeyE => (3, 9), KeyR => (3, 8),
    KeyT => (3, 7), KeyY => (3, 6), KeyU => (3, 5), KeyI => (3, 4),
    KeyO => (3, 3), KeyP => (3, 2), BracketLeft => (3, 1), BracketRight => (3, 0),

    KeyA => (2, 11), KeyS => (2, 10), KeyD => (2, 9), KeyF => (2, 8),
    KeyG => (2, 7), KeyH => (2, 6), KeyJ => (2, 5), KeyK => (2, 4),
    KeyL => (2, 3), Semicolon => (2, 2), Quote => (2, 1), Backslash => (2, 0),

    KeyZ => (1, 11), KeyX => (1, 10), KeyC => (1, 9), KeyV => (1, 8),
    KeyB => (1, 7), KeyN => (1, 6), KeyM => (1, 5), Comma => (1, 4),
    Period => (1, 3), Slash => (1, 2), Backquote => (1, 1), Backspace => (1, 0),

    ShiftLeft => (0, 11), MetaLeft => (0, 10), ArrowUp => (0, 9), ArrowDown => (0, 8),
    Space => (0, 5), ArrowLeft => (0, 4), Enter => (0, 3), ArrowRight => (0, 2),
    MetaRight => (0, 1), AltRight => (0, 0),
}

impl KeyCode {
    /// Function key `F{n}` for `n` in 1..=12.
    pub const fn function(n: u8) -> Option<Self> {
        Some(match n {
            1 => Self::F1,
            2 => Self::F2,
            3 => Self::F3,
            4 => Self::F4,
            5 => Self::F5,
            6 => Self::F6,
            7 => Self::F7,
            8 => Self::F8,
            9 => Self::F9,
            10 => Self::F10,
            11 => Self::F11,
            12 => Self::F12,
            _ => return None,
        })
    }

    /// The key that types `c` on a US layout, shifted or not.
    ///
    /// `'!'` and `'1'` both map to [`KeyCode::Digit1`].
    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'a' => Self::KeyA,
            'b' => Self::KeyB,
            'c' => Self::KeyC,
            'd' => Self::KeyD,
            'e' => Self::KeyE,
            'f' => Self::KeyF,
            'g' => Self::KeyG,
            'h' => Self::KeyH,
            'i' => Self::KeyI,
            'j' => Self::KeyJ,
            'k' => Self::KeyK,
            'l' => Self::KeyL,
            'm' => Self::KeyM,
            'n' => Self::KeyN,
            'o' => Self::KeyO,
            'p' => Self::KeyP,
            'q' => Self::KeyQ,
            'r' => Self::KeyR,
            's' => Self::KeyS,
            't' => Self::KeyT,
            'u' => Self::KeyU,
            'v' => Self::KeyV,
            'w' => Self::KeyW,
            'x' => Self::KeyX,
            'y' => Self::KeyY,
            'z' => Self::KeyZ,
            '1' | '!' => Self::Digit1,
            '2' | '@' => Self::Digit2,
            '3' | '#' => Self::Digit3,
            '4' | '$' => Self::Digit4,
            '5' | '%' => Self::Digit5,
            '6' | '^' => Self::Digit6,
            '7' | '&' => Self::Digit7,
            '8' | '*' => Self::Digit8,
            '9' | '(' => Self::Digit9,
            '0' | ')' => Self::Digit0,
            '=' | '+' => Self::Equal,
            '[' | '{' => Self::BracketLeft,
            ']' | '}' => Self::BracketRight,
            ';' | ':' => Self::Semicolon,
            '\'' | '"' => Self::Quote,
            '\\' | '|' => Self::Backslash,
            ',' | '<' => Self::Comma,
            '.' | '>' => Self::Period,
            '/' | '?' => Self::Slash,
            '`' | '~' => Self::Backquote,
            ' ' => Self::Space,
            _ => return None,
        })
    }

    /// Parse a comma-separated key list such as `"F7,AltRight"`.
    ///
    /// Whitespace around names is ignored.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, KeyParseError> {
        list.split(',').map(|name| name.trim().parse()).collect()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that changed.
    pub code: KeyCode,
    /// `true` for a press, `false` for a release.
    pub down: bool,
}

impl KeyEvent {
    /// A press of `code`.
    #[inline]
    pub const fn press(code: KeyCode) -> Self {
        Self { code, down: true }
    }

    /// A release of `code`.
    #[inline]
    pub const fn release(code: KeyCode) -> Self {
        Self { code, down: false }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.down { '↓' } else { '↑' };
        write!(f, "{}{arrow}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keyboard_has_seventy_keys() {
        assert_eq!(KeyCode::ALL.len(), 70);
    }

    #[test]
    fn test_matrix_positions_are_unique() {
        let positions: HashSet<_> = KeyCode::ALL.iter().map(|k| k.matrix_position()).collect();
        assert_eq!(positions.len(), KeyCode::ALL.len());
        for key in KeyCode::ALL {
            let pos = key.matrix_position();
            assert!((pos.row as usize) < MatrixPosition::ROWS);
            assert!((pos.col as usize) < MatrixPosition::COLS);
        }
    }

    #[test]
    fn test_name_round_trip() {
        for key in KeyCode::ALL {
            assert_eq!(key.as_str().parse::<KeyCode>(), Ok(*key));
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert_eq!(
            "Escape".parse::<KeyCode>(),
            Err(KeyParseError::Unknown("Escape".to_string()))
        );
        // Names are case sensitive, like DOM codes
        assert!("keyq".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            KeyCode::parse_list("F7, AltRight"),
            Ok(vec![KeyCode::F7, KeyCode::AltRight])
        );
        assert_eq!(KeyCode::parse_list("F7,,F8"), Err(KeyParseError::Empty));
    }

    #[test]
    fn test_scan_code() {
        // F7 sits at row 5, column 5
        assert_eq!(KeyCode::F7.matrix_position().scan_code(), 0x55);
        assert_eq!(KeyCode::ShiftLeft.matrix_position().scan_code(), 0xB0);
    }

    #[test]
    fn test_from_char() {
        assert_eq!(KeyCode::from_char('q'), Some(KeyCode::KeyQ));
        assert_eq!(KeyCode::from_char('Q'), Some(KeyCode::KeyQ));
        assert_eq!(KeyCode::from_char(' '), Some(KeyCode::Space));
        assert_eq!(KeyCode::from_char('-'), None);

        // Shifted symbols name the physical key underneath
        let shifted = [
            ('!', KeyCode::Digit1),
            ('@', KeyCode::Digit2),
            ('#', KeyCode::Digit3),
            ('$', KeyCode::Digit4),
            ('%', KeyCode::Digit5),
            ('^', KeyCode::Digit6),
            ('&', KeyCode::Digit7),
            ('*', KeyCode::Digit8),
            ('(', KeyCode::Digit9),
            (')', KeyCode::Digit0),
            ('+', KeyCode::Equal),
            ('{', KeyCode::BracketLeft),
            ('}', KeyCode::BracketRight),
            (':', KeyCode::Semicolon),
            ('"', KeyCode::Quote),
            ('|', KeyCode::Backslash),
            ('<', KeyCode::Comma),
            ('>', KeyCode::Period),
            ('?', KeyCode::Slash),
            ('~', KeyCode::Backquote),
        ];
        for (c, key) in shifted {
            assert_eq!(KeyCode::from_char(c), Some(key), "{c:?}");
        }
        // No minus key on this keyboard, shifted or not
        assert_eq!(KeyCode::from_char('_'), None);
    }

    #[test]
    fn test_function() {
        assert_eq!(KeyCode::function(1), Some(KeyCode::F1));
        assert_eq!(KeyCode::function(12), Some(KeyCode::F12));
        assert_eq!(KeyCode::function(13), None);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(KeyEvent::press(KeyCode::F7).to_string(), "F7↓");
        assert_eq!(KeyEvent::release(KeyCode::KeyX).to_string(), "KeyX↑");
    }
}
