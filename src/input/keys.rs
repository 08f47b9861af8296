//! Closed set of keyboard keys and their platform codes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown key name '{name}'")]
pub struct KeyParseError {
    pub name: String,
}

// Declares `Key` with its canonical name, extra accepted names and macOS virtual key code
macro_rules! keys {
    ($($variant:ident => $name:literal $(| $alias:literal)* : $code:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Key {
            $($variant),+
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$variant),+];

            /// Canonical lowercase name, as accepted by [`str::parse`]
            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => $name),+
                }
            }

            /// macOS virtual key code (`kVK_*`)
            pub fn mac_keycode(self) -> u16 {
                match self {
                    $(Key::$variant => $code),+
                }
            }
        }

        impl FromStr for Key {
            type Err = KeyParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $($name $(| $alias)* => Ok(Key::$variant),)+
                    _ => Err(KeyParseError { name: s.to_string() }),
                }
            }
        }
    };
}

keys! {
    Left => "left": 0x7B,
    Up => "up": 0x7E,
    Right => "right": 0x7C,
    Down => "down": 0x7D,

    Backspace => "backspace": 0x33,
    Tab => "tab": 0x30,
    Enter => "enter" | "return": 0x24,
    Shift => "shift": 0x38,
    Ctrl => "ctrl" | "control": 0x3B,
    Alt => "alt" | "option": 0x3A,
    Cmd => "cmd" | "command": 0x37,
    CapsLock => "caps" | "caps_lock": 0x39,
    Esc => "esc" | "escape": 0x35,
    Space => "space": 0x31,
    PageUp => "page_up": 0x74,
    PageDown => "page_down": 0x79,
    End => "end": 0x77,
    Home => "home": 0x73,
    Delete => "delete": 0x75,

    Num0 => "0": 0x1D,
    Num1 => "1": 0x12,
    Num2 => "2": 0x13,
    Num3 => "3": 0x14,
    Num4 => "4": 0x15,
    Num5 => "5": 0x17,
    Num6 => "6": 0x16,
    Num7 => "7": 0x1A,
    Num8 => "8": 0x1C,
    Num9 => "9": 0x19,

    A => "a": 0x00,
    B => "b": 0x0B,
    C => "c": 0x08,
    D => "d": 0x02,
    E => "e": 0x0E,
    F => "f": 0x03,
    G => "g": 0x05,
    H => "h": 0x04,
    I => "i": 0x22,
    J => "j": 0x26,
    K => "k": 0x28,
    L => "l": 0x25,
    M => "m": 0x2E,
    N => "n": 0x2D,
    O => "o": 0x1F,
    P => "p": 0x23,
    Q => "q": 0x0C,
    R => "r": 0x0F,
    S => "s": 0x01,
    T => "t": 0x11,
    U => "u": 0x20,
    V => "v": 0x09,
    W => "w": 0x0D,
    X => "x": 0x07,
    Y => "y": 0x10,
    Z => "z": 0x06,

    F1 => "f1": 0x7A,
    F2 => "f2": 0x78,
    F3 => "f3": 0x63,
    F4 => "f4": 0x76,
    F5 => "f5": 0x60,
    F6 => "f6": 0x61,
    F7 => "f7": 0x62,
    F8 => "f8": 0x64,
    F9 => "f9": 0x65,
    F10 => "f10": 0x6D,
    F11 => "f11": 0x67,
    F12 => "f12": 0x6F,

    Semicolon => ";": 0x29,
    Equals => "=": 0x18,
    Comma => ",": 0x2B,
    Minus => "-": 0x1B,
    Period => ".": 0x2F,
    Slash => "/": 0x2C,
    Backquote => "`": 0x32,
    LeftBracket => "[": 0x21,
    Backslash => "\\": 0x2A,
    RightBracket => "]": 0x1E,
    Quote => "'": 0x27,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_is_case_insensitive_with_aliases() {
        assert_eq!("LEFT".parse::<Key>(), Ok(Key::Left));
        assert_eq!("Caps_Lock".parse::<Key>(), Ok(Key::CapsLock));
        assert_eq!("caps".parse::<Key>(), Ok(Key::CapsLock));
        assert_eq!(" escape ".parse::<Key>(), Ok(Key::Esc));
        assert_eq!("\\".parse::<Key>(), Ok(Key::Backslash));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let err = "insert".parse::<Key>().unwrap_err();
        assert_eq!(err.name, "insert");
    }

    #[test]
    fn test_names_round_trip_and_codes_are_unique() {
        let mut codes = HashSet::new();
        for &key in Key::ALL {
            assert_eq!(key.name().parse::<Key>(), Ok(key));
            assert!(codes.insert(key.mac_keycode()), "duplicate code for {key}");
        }
        assert_eq!(Key::ALL.len(), 78);
    }
}
