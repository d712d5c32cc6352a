//! Adapter feeding winit keyboard input into a [`Manager`]
//!
//! winit names its keys after the W3C UI Events tables, so the `Debug` names
//! of `NamedKey` and `KeyCode` are already the `key` and `code` strings a
//! browser would report.

use winit::event::ElementState;
use winit::keyboard::{Key, NamedKey, PhysicalKey};

use super::events::KeyEvent;
use super::manager::Manager;

/// Convert winit's logical and physical key into a [`KeyEvent`]
pub fn key_event_from_winit(logical_key: &Key, physical_key: PhysicalKey) -> KeyEvent {
    let key = match logical_key {
        Key::Character(s) => s.to_string(),
        // The W3C key value for the space bar is a literal space
        Key::Named(NamedKey::Space) => " ".to_string(),
        Key::Named(named) => format!("{:?}", named),
        Key::Dead(_) => "Dead".to_string(),
        Key::Unidentified(_) => "Unidentified".to_string(),
    };

    let code = match physical_key {
        PhysicalKey::Code(code) => Some(format!("{:?}", code)),
        PhysicalKey::Unidentified(_) => None,
    };

    KeyEvent {
        key,
        code,
        target: None,
    }
}

/// Deliver a winit key press or release to `manager`
pub fn dispatch_winit_key(
    manager: &Manager,
    logical_key: &Key,
    physical_key: PhysicalKey,
    state: ElementState,
) {
    let event = key_event_from_winit(logical_key, physical_key);
    match state {
        ElementState::Pressed => manager.key_down(&event),
        ElementState::Released => manager.key_up(&event),
    }
}
