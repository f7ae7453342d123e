//! Electron-style accelerator strings, e.g. `CommandOrControl+Shift+S`.

use thiserror::Error;

/// Errors produced while parsing an accelerator string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AcceleratorError {
    #[error("empty accelerator")]
    Empty,

    #[error("unknown key {0:?}")]
    UnknownKey(String),

    /// The string ended in a modifier, e.g. `Ctrl+Shift`.
    #[error("accelerator {0:?} has no key")]
    MissingKey(String),

    #[error("accelerator {0:?} has more than one key")]
    MultipleKeys(String),
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// Modifier keys held together with the main key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Command on macOS, the Windows/Super key elsewhere.
    pub meta: bool,
}

impl Modifiers {
    /// Modifier state for a set of keys that are down.
    ///
    /// Left and right keys count separately, so releasing one of them leaves
    /// the modifier held while the other is still down.
    pub fn from_held(keys: &[rdev::Key]) -> Self {
        use rdev::Key::*;

        let mut modifiers = Self::default();
        for key in keys {
            match key {
                ControlLeft | ControlRight => modifiers.ctrl = true,
                Alt | AltGr => modifiers.alt = true,
                ShiftLeft | ShiftRight => modifiers.shift = true,
                MetaLeft | MetaRight => modifiers.meta = true,
                _ => {}
            }
        }
        modifiers
    }

    pub fn is_modifier(key: rdev::Key) -> bool {
        Self::from_held(&[key]) != Self::default()
    }
}

// ---------------------------------------------------------------------------
// Accelerator
// ---------------------------------------------------------------------------

/// A modifier set plus one non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accelerator {
    pub modifiers: Modifiers,
    pub key: rdev::Key,
}

impl Accelerator {
    pub fn new(modifiers: Modifiers, key: rdev::Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse `CommandOrControl+S`, `Ctrl+Shift+F9`, `Alt+Up`, ...
    ///
    /// Tokens are separated by `+` and matched case-insensitively.
    ///
    /// ```
    /// use capture_answer::shortcut::Accelerator;
    ///
    /// let accel = Accelerator::parse("Ctrl+Shift+F9").unwrap();
    /// assert!(accel.modifiers.ctrl && accel.modifiers.shift);
    /// assert_eq!(accel.key, rdev::Key::F9);
    /// ```
    pub fn parse(s: &str) -> Result<Self, AcceleratorError> {
        if s.trim().is_empty() {
            return Err(AcceleratorError::Empty);
        }

        let mut modifiers = Modifiers::default();
        let mut key = None;

        for token in s.split('+').map(str::trim) {
            match token.to_ascii_lowercase().as_str() {
                "commandorcontrol" | "cmdorctrl" => {
                    if cfg!(target_os = "macos") {
                        modifiers.meta = true;
                    } else {
                        modifiers.ctrl = true;
                    }
                }
                "ctrl" | "control" => modifiers.ctrl = true,
                "cmd" | "command" | "super" | "meta" => modifiers.meta = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                _ => {
                    let parsed = parse_key(token)
                        .ok_or_else(|| AcceleratorError::UnknownKey(token.to_string()))?;
                    if key.replace(parsed).is_some() {
                        return Err(AcceleratorError::MultipleKeys(s.to_string()));
                    }
                }
            }
        }

        let key = key.ok_or_else(|| AcceleratorError::MissingKey(s.to_string()))?;
        Ok(Self { modifiers, key })
    }
}

/// Map a single key name to an [`rdev::Key`].
///
/// Function keys, common named keys, ASCII letters and digits.
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key::*;

    let lower = name.to_ascii_lowercase();
    let key = match lower.as_str() {
        "f1" => F1,
        "f2" => F2,
        "f3" => F3,
        "f4" => F4,
        "f5" => F5,
        "f6" => F6,
        "f7" => F7,
        "f8" => F8,
        "f9" => F9,
        "f10" => F10,
        "f11" => F11,
        "f12" => F12,

        "escape" | "esc" => Escape,
        "space" => Space,
        "return" | "enter" => Return,
        "tab" => Tab,
        "backspace" => Backspace,
        "delete" | "del" => Delete,
        "home" => Home,
        "end" => End,
        "pageup" => PageUp,
        "pagedown" => PageDown,
        "up" => UpArrow,
        "down" => DownArrow,
        "left" => LeftArrow,
        "right" => RightArrow,
        "printscreen" => PrintScreen,

        single if single.len() == 1 => return char_key(single.chars().next()?),
        _ => return None,
    };
    Some(key)
}

fn char_key(c: char) -> Option<rdev::Key> {
    use rdev::Key::*;

    let key = match c {
        'a' => KeyA,
        'b' => KeyB,
        'c' => KeyC,
        'd' => KeyD,
        'e' => KeyE,
        'f' => KeyF,
        'g' => KeyG,
        'h' => KeyH,
        'i' => KeyI,
        'j' => KeyJ,
        'k' => KeyK,
        'l' => KeyL,
        'm' => KeyM,
        'n' => KeyN,
        'o' => KeyO,
        'p' => KeyP,
        'q' => KeyQ,
        'r' => KeyR,
        's' => KeyS,
        't' => KeyT,
        'u' => KeyU,
        'v' => KeyV,
        'w' => KeyW,
        'x' => KeyX,
        'y' => KeyY,
        'z' => KeyZ,
        '0' => Num0,
        '1' => Num1,
        '2' => Num2,
        '3' => Num3,
        '4' => Num4,
        '5' => Num5,
        '6' => Num6,
        '7' => Num7,
        '8' => Num8,
        '9' => Num9,
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_or_control_is_platform_specific() {
        let accel = Accelerator::parse("CommandOrControl+S").unwrap();
        assert_eq!(accel.key, rdev::Key::KeyS);
        if cfg!(target_os = "macos") {
            assert!(accel.modifiers.meta && !accel.modifiers.ctrl);
        } else {
            assert!(accel.modifiers.ctrl && !accel.modifiers.meta);
        }
        assert_eq!(Accelerator::parse("CmdOrCtrl+S").unwrap(), accel);
    }

    #[test]
    fn parse_multiple_modifiers() {
        let accel = Accelerator::parse("Ctrl+Shift+F9").unwrap();
        assert_eq!(
            accel.modifiers,
            Modifiers {
                ctrl: true,
                shift: true,
                ..Modifiers::default()
            }
        );
        assert_eq!(accel.key, rdev::Key::F9);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            Accelerator::parse("alt+up").unwrap(),
            Accelerator::parse("Alt+Up").unwrap()
        );
        assert_eq!(Accelerator::parse("Option+d").unwrap().key, rdev::Key::KeyD);
    }

    #[test]
    fn bare_key_is_allowed() {
        let accel = Accelerator::parse("F12").unwrap();
        assert_eq!(accel.modifiers, Modifiers::default());
        assert_eq!(accel.key, rdev::Key::F12);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Accelerator::parse(""), Err(AcceleratorError::Empty));
        assert!(matches!(
            Accelerator::parse("Ctrl+Hyper"),
            Err(AcceleratorError::UnknownKey(k)) if k == "Hyper"
        ));
        assert!(matches!(
            Accelerator::parse("Ctrl+Shift"),
            Err(AcceleratorError::MissingKey(_))
        ));
        assert!(matches!(
            Accelerator::parse("Ctrl+A+B"),
            Err(AcceleratorError::MultipleKeys(_))
        ));
    }

    #[test]
    fn parse_key_names_and_digits() {
        assert_eq!(parse_key("Esc"), Some(rdev::Key::Escape));
        assert_eq!(parse_key("Enter"), Some(rdev::Key::Return));
        assert_eq!(parse_key("7"), Some(rdev::Key::Num7));
        assert_eq!(parse_key("Z"), Some(rdev::Key::KeyZ));
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn modifiers_from_held_keys() {
        use rdev::Key::*;

        let mods = Modifiers::from_held(&[ShiftLeft, ControlRight, KeyA]);
        assert!(mods.shift && mods.ctrl && !mods.alt && !mods.meta);
        assert_eq!(Modifiers::from_held(&[KeyA]), Modifiers::default());

        assert!(Modifiers::is_modifier(MetaRight));
        assert!(Modifiers::is_modifier(AltGr));
        assert!(!Modifiers::is_modifier(KeyV));
    }
}
