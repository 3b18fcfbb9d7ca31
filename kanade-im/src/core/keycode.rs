//! Raw host key codes and key events

use std::fmt;

/// Key symbol (keysym) values as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keysym(pub u32);

impl Keysym {
    // Editing keys (XKB keysym values)
    pub const BACKSPACE: Keysym = Keysym(0xff08);
    pub const TAB: Keysym = Keysym(0xff09);
    pub const RETURN: Keysym = Keysym(0xff0d);
    pub const ESCAPE: Keysym = Keysym(0xff1b);
    pub const DELETE: Keysym = Keysym(0xffff);
    pub const KP_ENTER: Keysym = Keysym(0xff8d);

    // Cursor movement
    pub const HOME: Keysym = Keysym(0xff50);
    pub const LEFT: Keysym = Keysym(0xff51);
    pub const UP: Keysym = Keysym(0xff52);
    pub const RIGHT: Keysym = Keysym(0xff53);
    pub const DOWN: Keysym = Keysym(0xff54);
    pub const PAGE_UP: Keysym = Keysym(0xff55);
    pub const PAGE_DOWN: Keysym = Keysym(0xff56);
    pub const END: Keysym = Keysym(0xff57);

    // Japanese keyboard keys
    pub const MUHENKAN: Keysym = Keysym(0xff22);
    pub const HENKAN: Keysym = Keysym(0xff23);
    pub const HIRAGANA_KATAKANA: Keysym = Keysym(0xff27);
    pub const EISU_TOGGLE: Keysym = Keysym(0xff30);

    // Modifiers
    pub const SHIFT_L: Keysym = Keysym(0xffe1);
    pub const SHIFT_R: Keysym = Keysym(0xffe2);
    pub const CONTROL_L: Keysym = Keysym(0xffe3);
    pub const CONTROL_R: Keysym = Keysym(0xffe4);
    pub const CAPS_LOCK: Keysym = Keysym(0xffe5);
    pub const META_L: Keysym = Keysym(0xffe7);
    pub const META_R: Keysym = Keysym(0xffe8);
    pub const ALT_L: Keysym = Keysym(0xffe9);
    pub const ALT_R: Keysym = Keysym(0xffea);
    pub const SUPER_L: Keysym = Keysym(0xffeb);
    pub const SUPER_R: Keysym = Keysym(0xffec);
    pub const HYPER_L: Keysym = Keysym(0xffed);
    pub const HYPER_R: Keysym = Keysym(0xffee);

    // Space
    pub const SPACE: Keysym = Keysym(0x0020);

    // Function keys
    pub const F1: Keysym = Keysym(0xffbe);
    pub const F12: Keysym = Keysym(0xffc9);

    /// Check if this keysym represents a printable character
    pub fn is_printable(&self) -> bool {
        // ASCII printable range (0x20-0x7e)
        (0x0020..=0x007e).contains(&self.0)
    }

    /// Try to convert this keysym to a character
    pub fn to_char(&self) -> Option<char> {
        if self.is_printable() {
            char::from_u32(self.0)
        } else {
            None
        }
    }

    /// Function key number (1-12) if this is F1..F12
    pub fn function_number(&self) -> Option<u8> {
        if (Self::F1.0..=Self::F12.0).contains(&self.0) {
            Some((self.0 - Self::F1.0 + 1) as u8)
        } else {
            None
        }
    }

    /// Check if this is a modifier key
    pub fn is_modifier(&self) -> bool {
        matches!(
            *self,
            Self::SHIFT_L
                | Self::SHIFT_R
                | Self::CONTROL_L
                | Self::CONTROL_R
                | Self::CAPS_LOCK
                | Self::ALT_L
                | Self::ALT_R
                | Self::META_L
                | Self::META_R
                | Self::SUPER_L
                | Self::SUPER_R
                | Self::HYPER_L
                | Self::HYPER_R
        )
    }

    /// Look up a keysym by its conventional name.
    ///
    /// A single printable character maps to itself; otherwise XKB-style
    /// names are accepted case-insensitively (`Return`, `BackSpace`, `Kana`,
    /// `Eisu`, `F5`, ...).
    pub fn from_name(name: &str) -> Option<Keysym> {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next())
            && (' '..='~').contains(&ch)
        {
            return Some(Keysym(ch as u32));
        }

        let lower = name.to_ascii_lowercase();
        if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok())
            && (1..=12).contains(&n)
        {
            return Some(Keysym(Self::F1.0 + n - 1));
        }

        let keysym = match lower.as_str() {
            "space" => Self::SPACE,
            "return" | "enter" => Self::RETURN,
            "kp_enter" => Self::KP_ENTER,
            "backspace" => Self::BACKSPACE,
            "tab" => Self::TAB,
            "escape" | "esc" => Self::ESCAPE,
            "delete" => Self::DELETE,
            "home" => Self::HOME,
            "end" => Self::END,
            "left" => Self::LEFT,
            "right" => Self::RIGHT,
            "up" => Self::UP,
            "down" => Self::DOWN,
            "page_up" | "prior" => Self::PAGE_UP,
            "page_down" | "next" => Self::PAGE_DOWN,
            "henkan" | "henkan_mode" => Self::HENKAN,
            "muhenkan" => Self::MUHENKAN,
            "kana" | "hiragana_katakana" => Self::HIRAGANA_KATAKANA,
            "eisu" | "eisu_toggle" => Self::EISU_TOGGLE,
            "shift_l" => Self::SHIFT_L,
            "shift_r" => Self::SHIFT_R,
            "control_l" => Self::CONTROL_L,
            "control_r" => Self::CONTROL_R,
            _ => return None,
        };
        Some(keysym)
    }
}

impl fmt::Display for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ch) = self.to_char() {
            write!(f, "{}", ch)
        } else {
            write!(f, "Keysym(0x{:04x})", self.0)
        }
    }
}

/// Key modifier flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift_key: bool,
    pub control_key: bool,
    pub alt_key: bool,
    pub super_key: bool,
    pub caps_lock: bool,
}

/// XKB modifier bitmask constants used at the FFI boundary.
impl KeyModifiers {
    pub const SHIFT_MASK: u32 = 1; // ShiftMask
    pub const LOCK_MASK: u32 = 2; // LockMask
    pub const CONTROL_MASK: u32 = 4; // ControlMask
    pub const ALT_MASK: u32 = 8; // Mod1Mask
    pub const SUPER_MASK: u32 = 64; // Mod4Mask

    /// Decode a bitmask of XKB modifier flags into a `KeyModifiers` struct.
    pub fn from_modifier_state(state: u32) -> Self {
        Self {
            shift_key: (state & Self::SHIFT_MASK) != 0,
            control_key: (state & Self::CONTROL_MASK) != 0,
            alt_key: (state & Self::ALT_MASK) != 0,
            super_key: (state & Self::SUPER_MASK) != 0,
            caps_lock: (state & Self::LOCK_MASK) != 0,
        }
    }
}

impl KeyModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift_key = shift;
        self
    }

    pub fn with_control(mut self, control: bool) -> Self {
        self.control_key = control;
        self
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt_key = alt;
        self
    }

    /// True if a command-style modifier (Ctrl, Alt, Super) is held
    pub fn has_command_modifier(&self) -> bool {
        self.control_key || self.alt_key || self.super_key
    }

    pub fn is_empty(&self) -> bool {
        !self.shift_key && !self.control_key && !self.alt_key && !self.super_key && !self.caps_lock
    }
}

/// What kind of host event this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A key was pressed
    KeyDown,
    /// Only the modifier state changed (a modifier key went down or up)
    ModifierChange,
    /// The pointer moved or clicked inside the client's text area
    CursorUpdate,
}

/// A raw event as delivered by the host
#[derive(Debug, Clone)]
pub struct RawKeyEvent {
    /// Event type
    pub kind: EventKind,
    /// The key symbol (meaningless for cursor updates)
    pub keysym: Keysym,
    /// Modifier key state
    pub modifiers: KeyModifiers,
}

impl RawKeyEvent {
    pub fn new(kind: EventKind, keysym: Keysym, modifiers: KeyModifiers) -> Self {
        Self {
            kind,
            keysym,
            modifiers,
        }
    }

    /// Create a simple key-down event without modifiers
    pub fn press(keysym: Keysym) -> Self {
        Self::new(EventKind::KeyDown, keysym, KeyModifiers::default())
    }

    /// Create a key-down event with modifiers
    pub fn press_with(keysym: Keysym, modifiers: KeyModifiers) -> Self {
        Self::new(EventKind::KeyDown, keysym, modifiers)
    }

    /// Create a pointer/cursor update event
    pub fn cursor_update() -> Self {
        Self::new(EventKind::CursorUpdate, Keysym(0), KeyModifiers::default())
    }
}
