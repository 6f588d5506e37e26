//! Hotkey combo strings.
//!
//! Combos are written as modifier+key, e.g. `"ctrl+shift+s"` or
//! `"print_screen"`. Modifiers may appear in any order and parsing is
//! case-insensitive, so `"Shift+Ctrl+S"` and `"ctrl+shift+s"` are the same
//! binding.

use global_hotkey::hotkey::{Code, HotKey, Modifiers};

use super::HotkeyError;

/// A parsed, normalized key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    /// Lowercased key name, e.g. `"s"`, `"f5"`, `"print_screen"`.
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub super_key: bool,
}

impl KeyCombo {
    /// Parses a combo string like `"ctrl+shift+s"`. Spaces around `+` are
    /// tolerated. Fails with a descriptive error on empty input, missing key,
    /// or a key name with no known keycode.
    pub fn parse(spec: &str) -> Result<Self, HotkeyError> {
        let parse_err = |reason: &str| HotkeyError::Parse {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(parse_err("empty hotkey string"));
        }

        let mut ctrl = false;
        let mut shift = false;
        let mut alt = false;
        let mut super_key = false;
        let mut key = None;

        for part in trimmed.split('+').map(str::trim) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => ctrl = true,
                "shift" => shift = true,
                "alt" => alt = true,
                "super" | "meta" | "cmd" | "win" => super_key = true,
                "" => return Err(parse_err("empty component")),
                name => {
                    if key.is_some() {
                        return Err(parse_err("more than one non-modifier key"));
                    }
                    key = Some(name.to_string());
                }
            }
        }

        let key = key.ok_or_else(|| parse_err("no key specified"))?;
        let combo = Self {
            key,
            ctrl,
            shift,
            alt,
            super_key,
        };
        // Reject unknown key names at parse time, not at registration.
        combo.code()?;
        Ok(combo)
    }

    /// Maps the key name to a `global-hotkey` keycode.
    pub fn code(&self) -> Result<Code, HotkeyError> {
        key_code(&self.key).ok_or_else(|| HotkeyError::Parse {
            spec: self.to_string(),
            reason: format!("unknown key '{}'", self.key),
        })
    }

    fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        if self.ctrl {
            mods |= Modifiers::CONTROL;
        }
        if self.shift {
            mods |= Modifiers::SHIFT;
        }
        if self.alt {
            mods |= Modifiers::ALT;
        }
        if self.super_key {
            mods |= Modifiers::SUPER;
        }
        mods
    }

    /// Builds the OS-level hotkey for registration.
    pub fn to_hotkey(&self) -> Result<HotKey, HotkeyError> {
        let mods = self.modifiers();
        let mods = if mods.is_empty() { None } else { Some(mods) };
        Ok(HotKey::new(mods, self.code()?))
    }
}

impl std::fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "ctrl+")?;
        }
        if self.shift {
            write!(f, "shift+")?;
        }
        if self.alt {
            write!(f, "alt+")?;
        }
        if self.super_key {
            write!(f, "super+")?;
        }
        write!(f, "{}", self.key)
    }
}

fn key_code(name: &str) -> Option<Code> {
    // Single characters first.
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return char_code(c);
    }

    let code = match name {
        "print_screen" | "printscreen" | "prtsc" => Code::PrintScreen,
        "escape" | "esc" => Code::Escape,
        "space" => Code::Space,
        "enter" | "return" => Code::Enter,
        "tab" => Code::Tab,
        "backspace" => Code::Backspace,
        "insert" => Code::Insert,
        "delete" => Code::Delete,
        "home" => Code::Home,
        "end" => Code::End,
        "page_up" | "pageup" => Code::PageUp,
        "page_down" | "pagedown" => Code::PageDown,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        _ => return None,
    };
    Some(code)
}

fn char_code(c: char) -> Option<Code> {
    let code = match c.to_ascii_lowercase() {
        'a' => Code::KeyA,
        'b' => Code::KeyB,
        'c' => Code::KeyC,
        'd' => Code::KeyD,
        'e' => Code::KeyE,
        'f' => Code::KeyF,
        'g' => Code::KeyG,
        'h' => Code::KeyH,
        'i' => Code::KeyI,
        'j' => Code::KeyJ,
        'k' => Code::KeyK,
        'l' => Code::KeyL,
        'm' => Code::KeyM,
        'n' => Code::KeyN,
        'o' => Code::KeyO,
        'p' => Code::KeyP,
        'q' => Code::KeyQ,
        'r' => Code::KeyR,
        's' => Code::KeyS,
        't' => Code::KeyT,
        'u' => Code::KeyU,
        'v' => Code::KeyV,
        'w' => Code::KeyW,
        'x' => Code::KeyX,
        'y' => Code::KeyY,
        'z' => Code::KeyZ,
        '0' => Code::Digit0,
        '1' => Code::Digit1,
        '2' => Code::Digit2,
        '3' => Code::Digit3,
        '4' => Code::Digit4,
        '5' => Code::Digit5,
        '6' => Code::Digit6,
        '7' => Code::Digit7,
        '8' => Code::Digit8,
        '9' => Code::Digit9,
        '-' => Code::Minus,
        '=' => Code::Equal,
        ',' => Code::Comma,
        '.' => Code::Period,
        '/' => Code::Slash,
        ';' => Code::Semicolon,
        '\'' => Code::Quote,
        '`' => Code::Backquote,
        _ => return None,
    };
    Some(code)
}
