//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chordwatch::config::Settings;
use chordwatch::shortcuts::{ElementTree, KeyEvent, Manager, MatchEvent, TimerQueue};

/// A manager wired to an in-memory element tree and a virtual clock
pub struct Harness {
    pub manager: Manager,
    pub tree: Rc<ElementTree>,
    pub timers: Rc<TimerQueue>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let tree = Rc::new(ElementTree::new());
        let timers = Rc::new(TimerQueue::new());
        let manager = Manager::with_settings(settings, tree.clone(), timers.clone());
        Self {
            manager,
            tree,
            timers,
        }
    }

    pub fn down(&self, key: &str) {
        self.manager.key_down(&KeyEvent::new(key));
    }

    pub fn up(&self, key: &str) {
        self.manager.key_up(&KeyEvent::new(key));
    }

    /// All keys down in order, then all keys up in order
    pub fn press(&self, keys: &[&str]) {
        for key in keys {
            self.down(key);
        }
        for key in keys {
            self.up(key);
        }
    }

    pub fn wait_ms(&self, ms: u64) {
        self.timers.advance(Duration::from_millis(ms));
    }
}

/// A shared counter and a match handler that bumps it
pub fn counter() -> (Rc<Cell<u32>>, impl Fn(&MatchEvent) + 'static) {
    let count = Rc::new(Cell::new(0));
    let handle = Rc::clone(&count);
    (count, move |_: &MatchEvent| handle.set(handle.get() + 1))
}

/// A shared log of strings and a pusher for it
pub fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(String) + Clone + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let handle = Rc::clone(&log);
    (log, move |line: String| handle.borrow_mut().push(line))
}
