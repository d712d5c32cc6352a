//! Centralized configuration paths for chordwatch
//!
//! All config files live under:
//! - Unix/macOS: `~/.config/chordwatch/`
//! - Windows: `%APPDATA%\chordwatch\`

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "chordwatch";
const LOG_PREFIX: &str = "chordwatch.log";

/// Base config directory
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/chordwatch`
///   - Else: `~/.config/chordwatch`
///
/// Windows:
///   - `%APPDATA%\chordwatch`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/chordwatch/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/chordwatch/shortcuts.yaml`
pub fn shortcuts_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("shortcuts.yaml"))
}

/// `~/.config/chordwatch/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

/// Most recent daily log file (`chordwatch.log.YYYY-MM-DD`), or the
/// undated name when no rotated file exists yet
pub fn log_file() -> Option<PathBuf> {
    logs_dir().map(|dir| newest_log_in(&dir))
}

/// A missing directory counts as holding no rotated files
fn newest_log_in(logs_dir: &Path) -> PathBuf {
    fs::read_dir(logs_dir)
        .ok()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_PREFIX))
        })
        .max()
        .unwrap_or_else(|| logs_dir.join(LOG_PREFIX))
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Ensure the base config dir exists, returning it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensure logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = ensure_config_dir()?.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_log_in_missing_dir_is_undated_name() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");

        assert_eq!(newest_log_in(&logs), logs.join("chordwatch.log"));
    }

    #[test]
    fn test_newest_log_in_picks_latest_rotation() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "chordwatch.log.2026-01-06",
            "chordwatch.log.2026-01-07",
            "other.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(
            newest_log_in(dir.path()),
            dir.path().join("chordwatch.log.2026-01-07")
        );
    }
}
