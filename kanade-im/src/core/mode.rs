//! Composition modes and the host mode-id table

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Prefix shared by every host input-mode identifier this IME registers.
pub const HOST_MODE_PREFIX: &str = "com.kanade.inputmethod.Japanese";

const ROMAN_ID: &str = "com.kanade.inputmethod.Japanese.Roman";
const HIRAGANA_ID: &str = "com.kanade.inputmethod.Japanese.Hiragana";
const KATAKANA_ID: &str = "com.kanade.inputmethod.Japanese.Katakana";
const HALF_KATAKANA_ID: &str = "com.kanade.inputmethod.Japanese.HalfWidthKana";
const FULL_ROMAN_ID: &str = "com.kanade.inputmethod.Japanese.FullWidthRoman";

/// The composition mode of a session.
///
/// `Off` is direct input: keys go straight to the host and nothing is
/// composed. Every other variant is an active script mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    #[default]
    Off,
    Hiragana,
    FullKatakana,
    HalfKatakana,
    FullAscii,
    HalfAscii,
}

static MODE_TABLE: OnceLock<HashMap<&'static str, CompositionMode>> = OnceLock::new();

/// Host mode id → composition mode, built once on first use.
fn mode_table() -> &'static HashMap<&'static str, CompositionMode> {
    MODE_TABLE.get_or_init(|| {
        HashMap::from([
            (HOST_MODE_PREFIX, CompositionMode::Hiragana),
            (ROMAN_ID, CompositionMode::HalfAscii),
            (HIRAGANA_ID, CompositionMode::Hiragana),
            (KATAKANA_ID, CompositionMode::FullKatakana),
            (HALF_KATAKANA_ID, CompositionMode::HalfKatakana),
            (FULL_ROMAN_ID, CompositionMode::FullAscii),
        ])
    })
}

impl CompositionMode {
    /// All active (composing) modes
    pub const ACTIVE: [CompositionMode; 5] = [
        CompositionMode::Hiragana,
        CompositionMode::FullKatakana,
        CompositionMode::HalfKatakana,
        CompositionMode::FullAscii,
        CompositionMode::HalfAscii,
    ];

    /// True for every mode except `Off`
    pub fn is_active(&self) -> bool {
        !matches!(self, CompositionMode::Off)
    }

    /// Map an opaque host mode id to a mode. Unknown ids map to `Off`.
    pub fn from_host_id(id: &str) -> Self {
        mode_table().get(id).copied().unwrap_or(CompositionMode::Off)
    }

    /// The host mode id used to reflect this mode in the host's indicator.
    ///
    /// `Off` shares the Roman id with `HalfAscii`: the host shows direct
    /// input for both.
    pub fn host_id(&self) -> &'static str {
        match self {
            CompositionMode::Off | CompositionMode::HalfAscii => ROMAN_ID,
            CompositionMode::Hiragana => HIRAGANA_ID,
            CompositionMode::FullKatakana => KATAKANA_ID,
            CompositionMode::HalfKatakana => HALF_KATAKANA_ID,
            CompositionMode::FullAscii => FULL_ROMAN_ID,
        }
    }

    /// Short indicator label for status displays
    pub fn indicator(&self) -> &'static str {
        match self {
            CompositionMode::Off => "-",
            CompositionMode::Hiragana => "あ",
            CompositionMode::FullKatakana => "ア",
            CompositionMode::HalfKatakana => "ｱ",
            CompositionMode::FullAscii => "Ａ",
            CompositionMode::HalfAscii => "A",
        }
    }
}
