//! Declarative key-combination bindings
//!
//! This module provides an event-driven shortcut engine that:
//! - Fires a handler when a whole key combination is held at once
//! - Fires a release handler when that combination is let go
//! - Supports fire-once, double-press and scoped bindings
//! - Lets plugins observe the binding lifecycle and veto matches
//!
//! # Architecture
//!
//! ```text
//! host key event → Manager::key_down/key_up → EventSource → Binding state machine
//!                                                              ↓
//!                                   PluginDispatcher (veto?) → handler → plugins
//! ```
//!
//! # Registering bindings
//!
//! ```ignore
//! let manager = Manager::new(surface, scheduler);
//!
//! manager
//!     .register(["Control", "k"])
//!     .then(|e| open_palette(&e.keys))
//!     .when_released(|_| close_hint());
//!
//! manager.group("Alt", |m| {
//!     m.register(["1"]).then(|_| select_tab(1));
//! });
//! ```

mod binding;
mod config;
mod events;
pub mod global;
mod manager;
mod plugins;
mod scheduler;
mod surface;
mod winit_adapter;

pub use binding::{
    Binding, BindingId, BindingStatus, MatchEvent, ReleaseEvent, DEFAULT_DOUBLE_PRESS_WINDOW,
};
pub use config::{
    install, load_shortcuts_file, parse_combo, parse_shortcuts_yaml, ShortcutAction,
    ShortcutFileError, ShortcutSpec,
};
pub use events::{EventSource, KeyEvent, KeyEventKind, ListenerId};
pub use manager::{Group, KeyList, Manager};
pub use plugins::{is_vetoed, Hook, Plugin, PluginDispatcher, PluginWith, WithOptions};
pub use scheduler::{Scheduler, Task, TimerQueue};
pub use surface::{ElementId, ElementTree, Scope, Surface};
pub use winit_adapter::{dispatch_winit_key, key_event_from_winit};
