//! chordwatch - declarative keyboard shortcut bindings
//!
//! This crate provides a key-combination matching engine: register the keys
//! of a shortcut, get called when they are all held and again when they are
//! released. Plugins can observe the binding lifecycle and veto matches.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod replay;
pub mod shortcuts;
pub mod tracing;

// Re-export commonly used types
pub use config::Settings;
pub use shortcuts::{Binding, KeyEvent, Manager, MatchEvent, Plugin, ReleaseEvent};
