//! Request/response types exchanged with the conversion engine

use serde::{Deserialize, Serialize};

use super::candidate::{CandidateId, CandidateList};
use super::mode::CompositionMode;
use super::preedit::Preedit;
use super::translator::NormalizedKeyEvent;

/// Explicit commands sent outside of key events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    /// Finalize the current composition
    Submit,
    /// Pick a candidate from the current list
    SelectCandidate { id: CandidateId },
    /// Change the active script mode without turning composition off
    SwitchInputMode { mode: CompositionMode },
    /// Discard the current composition without committing it
    Revert,
}

/// Auxiliary tools the host can launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Config,
    DictionaryTool,
    WordRegister,
    CharacterPalette,
    About,
}

impl ToolKind {
    /// Parse a tool name as used in menus and the FFI (`config`, `dictionary_tool`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let tool = match name {
            "config" => ToolKind::Config,
            "dictionary_tool" | "dictionary" => ToolKind::DictionaryTool,
            "word_register" => ToolKind::WordRegister,
            "character_palette" | "palette" => ToolKind::CharacterPalette,
            "about" => ToolKind::About,
            _ => return None,
        };
        Some(tool)
    }

    /// Stable numeric code used across the C FFI
    pub fn code(&self) -> u32 {
        match self {
            ToolKind::Config => 1,
            ToolKind::DictionaryTool => 2,
            ToolKind::WordRegister => 3,
            ToolKind::CharacterPalette => 4,
            ToolKind::About => 5,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let tool = match code {
            1 => ToolKind::Config,
            2 => ToolKind::DictionaryTool,
            3 => ToolKind::WordRegister,
            4 => ToolKind::CharacterPalette,
            5 => ToolKind::About,
            _ => return None,
        };
        Some(tool)
    }
}

/// A key request: the key plus advisory typed-input context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: NormalizedKeyEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_input: Option<String>,
}

/// Reply to session creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: u64,
}

/// The engine's answer to one key or command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResponse {
    /// Whether the key was handled. `false` means pass it through unmodified.
    #[serde(default)]
    pub consumed: bool,
    /// Literal text to commit to the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// New preedit; absent means the composition is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preedit: Option<Preedit>,
    /// Candidates to show; absent means hide the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<CandidateList>,
    /// Mode the engine switched to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<CompositionMode>,
    /// Link the engine asks the host to open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Tool the engine asks the host to launch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_tool: Option<ToolKind>,
}

impl EngineResponse {
    pub fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }

    pub fn not_consumed() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, text: impl Into<String>) -> Self {
        self.result = Some(text.into());
        self
    }

    pub fn with_preedit(mut self, preedit: Preedit) -> Self {
        self.preedit = Some(preedit);
        self
    }

    pub fn with_candidates(mut self, candidates: CandidateList) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn with_mode(mut self, mode: CompositionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_launch_tool(mut self, tool: ToolKind) -> Self {
        self.launch_tool = Some(tool);
        self
    }

    /// Number of candidates carried (0 when absent)
    pub fn candidate_count(&self) -> usize {
        self.candidates.as_ref().map_or(0, |c| c.len())
    }
}
