//! Key translation: raw host events → normalized key events for the engine

use serde::{Deserialize, Serialize};

use super::keycode::{EventKind, KeyModifiers, Keysym, RawKeyEvent};
use super::mode::CompositionMode;

/// Keys with a meaning beyond the character they type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKey {
    /// Turn composition on
    On,
    /// Turn composition off
    Off,
    Enter,
    Space,
    Backspace,
    Delete,
    Escape,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Henkan,
    Muhenkan,
    Function(u8),
}

/// Modifier bitmask sent to the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierMask(pub u8);

impl ModifierMask {
    pub const SHIFT: u8 = 1;
    pub const CTRL: u8 = 2;
    pub const ALT: u8 = 4;
    pub const SUPER: u8 = 8;
    pub const CAPS: u8 = 16;

    pub fn contains(&self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<KeyModifiers> for ModifierMask {
    fn from(mods: KeyModifiers) -> Self {
        let mut mask = 0;
        if mods.shift_key {
            mask |= Self::SHIFT;
        }
        if mods.control_key {
            mask |= Self::CTRL;
        }
        if mods.alt_key {
            mask |= Self::ALT;
        }
        if mods.super_key {
            mask |= Self::SUPER;
        }
        if mods.caps_lock {
            mask |= Self::CAPS;
        }
        ModifierMask(mask)
    }
}

/// A key event in the engine's vocabulary.
///
/// Produced once by [`translate`] (or one of the signal constructors) and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedKeyEvent {
    /// Unicode scalar of the printable character, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_code: Option<u32>,
    #[serde(default, skip_serializing_if = "ModifierMask::is_empty")]
    modifiers: ModifierMask,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    special_key: Option<SpecialKey>,
    /// Mode the engine should activate in (turn-on signal only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<CompositionMode>,
}

impl NormalizedKeyEvent {
    /// A printable character key
    pub fn character(ch: char, modifiers: ModifierMask) -> Self {
        Self {
            key_code: Some(ch as u32),
            modifiers,
            special_key: None,
            mode: None,
        }
    }

    /// A special key
    pub fn special(key: SpecialKey, modifiers: ModifierMask) -> Self {
        Self {
            key_code: None,
            modifiers,
            special_key: Some(key),
            mode: None,
        }
    }

    /// The explicit turn-on signal. Carries no text.
    pub fn turn_on(mode: CompositionMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::special(SpecialKey::On, ModifierMask::default())
        }
    }

    /// The explicit turn-off signal
    pub fn turn_off() -> Self {
        Self::special(SpecialKey::Off, ModifierMask::default())
    }

    pub fn key_code(&self) -> Option<u32> {
        self.key_code
    }

    pub fn modifiers(&self) -> ModifierMask {
        self.modifiers
    }

    pub fn special_key(&self) -> Option<SpecialKey> {
        self.special_key
    }

    pub fn mode(&self) -> Option<CompositionMode> {
        self.mode
    }

    /// The character this key types, if it types one.
    ///
    /// Shift and Caps Lock still type; Ctrl/Alt/Super chords do not.
    pub fn printable_char(&self) -> Option<char> {
        let command = ModifierMask::CTRL | ModifierMask::ALT | ModifierMask::SUPER;
        if self.modifiers.0 & command != 0 {
            return None;
        }
        self.key_code.and_then(char::from_u32)
    }
}

fn special_key_for(keysym: Keysym) -> Option<SpecialKey> {
    if let Some(n) = keysym.function_number() {
        return Some(SpecialKey::Function(n));
    }
    let key = match keysym {
        Keysym::RETURN | Keysym::KP_ENTER => SpecialKey::Enter,
        Keysym::SPACE => SpecialKey::Space,
        Keysym::BACKSPACE => SpecialKey::Backspace,
        Keysym::DELETE => SpecialKey::Delete,
        Keysym::ESCAPE => SpecialKey::Escape,
        Keysym::TAB => SpecialKey::Tab,
        Keysym::LEFT => SpecialKey::Left,
        Keysym::RIGHT => SpecialKey::Right,
        Keysym::UP => SpecialKey::Up,
        Keysym::DOWN => SpecialKey::Down,
        Keysym::HOME => SpecialKey::Home,
        Keysym::END => SpecialKey::End,
        Keysym::PAGE_UP => SpecialKey::PageUp,
        Keysym::PAGE_DOWN => SpecialKey::PageDown,
        Keysym::HENKAN => SpecialKey::Henkan,
        Keysym::MUHENKAN => SpecialKey::Muhenkan,
        Keysym::HIRAGANA_KATAKANA => SpecialKey::On,
        Keysym::EISU_TOGGLE => SpecialKey::Off,
        _ => return None,
    };
    Some(key)
}

/// Translate a raw host event into the engine's key vocabulary.
///
/// Returns `None` for events the engine never sees: modifier changes,
/// cursor updates, bare modifier keys and keysyms with no mapping. The
/// caller passes those through to the host.
pub fn translate(event: &RawKeyEvent) -> Option<NormalizedKeyEvent> {
    if event.kind != EventKind::KeyDown || event.keysym.is_modifier() {
        return None;
    }
    let modifiers = ModifierMask::from(event.modifiers);

    if let Some(special) = special_key_for(event.keysym) {
        return Some(NormalizedKeyEvent::special(special, modifiers));
    }

    event
        .keysym
        .to_char()
        .map(|ch| NormalizedKeyEvent::character(ch, modifiers))
}
