//! Scripted key sessions replayed against a shortcut file
//!
//! A session describes a small element tree and a list of steps:
//!
//! ```yaml
//! elements:
//!   - tag: input
//!     id: query
//! steps:
//!   - press: [Control, k]
//!   - wait: 600
//!   - focus: "#query"
//!   - down: { key: a, code: KeyA }
//!   - up: a
//!   - blur: true
//! ```

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::Settings;
use crate::shortcuts::{
    install, ElementTree, KeyEvent, Manager, ShortcutAction, ShortcutSpec, Surface, TimerQueue,
};

/// Root structure of a session file
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub elements: Vec<ElementEntry>,
    pub steps: Vec<Step>,
}

/// An element to create before the steps run
#[derive(Debug, Clone, Deserialize)]
pub struct ElementEntry {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub class: Vec<String>,
    /// Selector of the parent element; the root when absent
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Down { down: KeyInput },
    Up { up: KeyInput },
    /// All keys down in order, then all keys up in order
    Press { press: Vec<String> },
    Wait { wait: u64 },
    Focus { focus: String },
    Blur { blur: bool },
}

/// A key given either by name or with its physical code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeyInput {
    Key(String),
    Detailed {
        key: String,
        #[serde(default)]
        code: Option<String>,
    },
}

impl KeyInput {
    fn to_event(&self) -> KeyEvent {
        match self {
            KeyInput::Key(key) => KeyEvent::new(key.as_str()),
            KeyInput::Detailed { key, code } => KeyEvent {
                key: key.clone(),
                code: code.clone(),
                target: None,
            },
        }
    }
}

/// Load a session from a YAML file
pub fn load_session_file(path: &Path) -> Result<Session, SessionError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SessionError::IoError(e.to_string()))?;
    parse_session_yaml(&content)
}

/// Parse a session from a YAML string
pub fn parse_session_yaml(yaml: &str) -> Result<Session, SessionError> {
    serde_yaml::from_str(yaml).map_err(|e| SessionError::ParseError(e.to_string()))
}

/// A headless manager wired to a virtual clock, with every match and
/// release recorded as a line of output
pub struct Replay {
    manager: Manager,
    tree: Rc<ElementTree>,
    timers: Rc<TimerQueue>,
    output: Rc<RefCell<Vec<String>>>,
}

impl Replay {
    /// Build the element tree, then install the shortcuts against it
    pub fn new(
        settings: Settings,
        elements: &[ElementEntry],
        specs: &[ShortcutSpec],
    ) -> Result<Self, SessionError> {
        let tree = Rc::new(ElementTree::new());
        for entry in elements {
            let parent = match entry.parent {
                Some(ref selector) => tree
                    .query_selector(selector)
                    .ok_or_else(|| SessionError::UnknownElement(selector.clone()))?,
                None => tree.root(),
            };
            let element = tree.append(parent, &entry.tag);
            if let Some(ref id) = entry.id {
                tree.set_id(element, id);
            }
            for class in &entry.class {
                tree.add_class(element, class);
            }
            tree.set_content_editable(element, entry.editable);
        }

        let timers = Rc::new(TimerQueue::new());
        let manager = Manager::with_settings(settings, tree.clone(), timers.clone());
        let output = Rc::new(RefCell::new(Vec::new()));

        let clock = Rc::clone(&timers);
        let lines = Rc::clone(&output);
        install(&manager, specs, move |action| {
            let at = clock.now().as_millis();
            let line = match action {
                ShortcutAction::Matched { action, keys } => {
                    format!("{:>6}ms matched  {} [{}]", at, action, keys.join("+"))
                }
                ShortcutAction::Released { action } => {
                    format!("{:>6}ms released {}", at, action)
                }
            };
            lines.borrow_mut().push(line);
        });

        Ok(Self {
            manager,
            tree,
            timers,
            output,
        })
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Run every step and return the output lines produced so far
    pub fn run(&self, steps: &[Step]) -> Result<Vec<String>, SessionError> {
        for step in steps {
            self.step(step)?;
        }
        Ok(self.output.borrow().clone())
    }

    fn step(&self, step: &Step) -> Result<(), SessionError> {
        tracing::debug!(?step, "replay step");
        match step {
            Step::Down { down } => self.manager.key_down(&down.to_event()),
            Step::Up { up } => self.manager.key_up(&up.to_event()),
            Step::Press { press } => {
                for key in press {
                    self.manager.key_down(&KeyEvent::new(key.as_str()));
                }
                for key in press {
                    self.manager.key_up(&KeyEvent::new(key.as_str()));
                }
            }
            Step::Wait { wait } => self.timers.advance(Duration::from_millis(*wait)),
            Step::Focus { focus } => {
                let element = self
                    .tree
                    .query_selector(focus)
                    .ok_or_else(|| SessionError::UnknownElement(focus.clone()))?;
                self.tree.focus(element);
            }
            Step::Blur { blur } => {
                if *blur {
                    self.tree.blur();
                }
            }
        }
        Ok(())
    }
}

/// Errors that can occur when loading or running a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    IoError(String),
    ParseError(String),
    UnknownElement(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::IoError(e) => write!(f, "IO error: {}", e),
            SessionError::ParseError(e) => write!(f, "Parse error: {}", e),
            SessionError::UnknownElement(s) => write!(f, "No element matches: {}", s),
        }
    }
}

impl std::error::Error for SessionError {}
