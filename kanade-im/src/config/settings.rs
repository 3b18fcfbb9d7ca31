//! Settings configuration
//!
//! Manages user-configurable settings for the IME bridge.
//! Default values are defined in `config/default.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::mode::CompositionMode;

/// Default configuration TOML embedded from config/default.toml
const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Configuration settings for the IME bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Conversion engine connection
    pub engine: EngineSettings,
    /// Input behavior
    pub input: InputSettings,
    /// Candidate window behavior
    pub candidate_window: CandidateWindowSettings,
}

/// Conversion engine connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Base URL of the engine server
    pub endpoint: String,
    /// Per-request deadline in milliseconds
    pub timeout_ms: u64,
}

/// Input behavior settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Mode entered by the On key
    pub initial_mode: CompositionMode,
    /// Send the typed-input accumulator with key requests
    pub track_original_input: bool,
}

/// Candidate window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateWindowSettings {
    /// Keep the window anchored while it stays visible
    pub freeze_position: bool,
}

impl Default for Settings {
    fn default() -> Self {
        // The embedded file is covered by test_default_settings
        parse_with_defaults("").unwrap_or_else(|e| {
            warn!("embedded default.toml is invalid: {}", e);
            Self {
                engine: EngineSettings {
                    endpoint: "http://127.0.0.1:7450".to_string(),
                    timeout_ms: 1500,
                },
                input: InputSettings {
                    initial_mode: CompositionMode::Hiragana,
                    track_original_input: true,
                },
                candidate_window: CandidateWindowSettings {
                    freeze_position: true,
                },
            }
        })
    }
}

/// Recursively merge `overlay` TOML values on top of `base`.
fn merge_toml(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key.clone(), value.clone());
                }
            }
        }
        (base, _) => {
            *base = overlay.clone();
        }
    }
}

/// Parse user TOML content merged on top of default.toml.
fn parse_with_defaults(user_content: &str) -> Result<Settings> {
    let mut base: toml::Value = toml::from_str(DEFAULT_CONFIG_TOML)?;
    let user: toml::Value = toml::from_str(user_content)?;
    merge_toml(&mut base, &user);
    let settings: Settings = base.try_into()?;
    Ok(settings)
}

/// Get the project directories for kanade-im.
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "kanade", "kanade-im")
}

impl Settings {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load settings from the default configuration file.
    /// Falls back to embedded default.toml if the config file does not exist.
    pub fn load() -> Result<Self> {
        let Some(config_file) = Self::config_file() else {
            warn!("Could not determine config directory, using defaults");
            return Ok(Self::default());
        };

        if !config_file.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        debug!("Loading config from {:?}", config_file);
        let content = fs::read_to_string(&config_file)?;
        parse_with_defaults(&content)
    }

    /// Load settings from a specific file, merged on top of defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        parse_with_defaults(&content)
    }

    /// Save settings to the default configuration file
    pub fn save(&self) -> Result<()> {
        let Some(config_file) = Self::config_file() else {
            anyhow::bail!("Could not determine config directory");
        };
        debug!("Saving config to {:?}", config_file);
        self.save_to(&config_file)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
