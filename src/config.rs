//! Engine settings persistence
//!
//! Stores defaults for new bindings in `~/.config/chordwatch/config.yaml`

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Defaults applied to every binding a manager creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Window for `twice_rapidly` bindings, in milliseconds
    #[serde(default = "default_double_press_window_ms")]
    pub double_press_window_ms: u64,

    /// Whether bindings match while a text input holds focus
    #[serde(default)]
    pub include_form_targets: bool,
}

fn default_double_press_window_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            double_press_window_ms: default_double_press_window_ms(),
            include_form_targets: false,
        }
    }
}

impl Settings {
    pub fn double_press_window(&self) -> Duration {
        Duration::from_millis(self.double_press_window_ms)
    }

    /// Load settings from the user config file, or return defaults if missing
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load settings from `path`, falling back to defaults on any failure
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Settings not found at {}, using defaults", path.display());
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read settings at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_yaml::from_str(&content) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the user config file
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write settings to {}: {}", path.display(), e))?;

        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }
}
