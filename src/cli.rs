//! Command-line argument parsing for the replay tool
//!
//! Supports:
//! - Replaying a key session against a shortcut file
//! - Validating and listing a shortcut file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Replay key sessions against shortcut definitions
#[derive(Parser, Debug)]
#[command(name = "chordwatch", version, about = "Replay key sessions against shortcuts")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Log matches, vetoes and releases to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Replay a session file and print every match and release
    Replay {
        /// Session file describing elements and key steps
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        /// Shortcut file (defaults to ~/.config/chordwatch/shortcuts.yaml)
        #[arg(short, long, value_name = "FILE")]
        shortcuts: Option<PathBuf>,
    },

    /// Validate a shortcut file and list its bindings
    Check {
        /// Shortcut file (defaults to ~/.config/chordwatch/shortcuts.yaml)
        #[arg(value_name = "FILE")]
        shortcuts: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Console log filter used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "chordwatch=debug"
        } else {
            "warn"
        }
    }
}

/// Use the given shortcut file, or fall back to the one in the config directory
pub fn resolve_shortcuts_path(path: Option<PathBuf>) -> Result<PathBuf, String> {
    path.or_else(crate::config_paths::shortcuts_file)
        .ok_or_else(|| "No shortcut file given and no config directory available".to_string())
}
