//! YAML shortcut files
//!
//! Declares bindings by key combination and action name:
//!
//! ```yaml
//! bindings:
//!   - keys: "Control+Shift+k"
//!     action: open-palette
//!   - keys: [Escape]
//!     action: close
//!     twice_rapidly: 300
//! groups:
//!   - modifiers: Alt
//!     bindings:
//!       - keys: "1"
//!         action: tab-1
//! ```

use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;

use super::binding::Binding;
use super::manager::Manager;

/// Root structure of a shortcut file
#[derive(Debug, Deserialize)]
pub struct ShortcutFile {
    #[serde(default)]
    pub bindings: Vec<ShortcutEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

/// A single binding entry from YAML
#[derive(Debug, Deserialize)]
pub struct ShortcutEntry {
    pub keys: KeysField,
    pub action: String,
    #[serde(default)]
    pub once: bool,
    #[serde(default)]
    pub twice_rapidly: Option<DoublePressField>,
    #[serde(default)]
    pub within: Option<String>,
    #[serde(default)]
    pub allow_in_forms: bool,
}

/// Bindings sharing a set of modifier keys
#[derive(Debug, Deserialize)]
pub struct GroupEntry {
    pub modifiers: KeysField,
    pub bindings: Vec<ShortcutEntry>,
}

/// Keys written either as `"Control+k"` or as a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KeysField {
    Combo(String),
    List(Vec<String>),
}

/// `twice_rapidly: true` or `twice_rapidly: <window ms>`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DoublePressField {
    Enabled(bool),
    WindowMs(u64),
}

/// A parsed, validated shortcut ready to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSpec {
    /// Full combination, group modifiers first
    pub keys: Vec<String>,
    pub action: String,
    pub once: bool,
    pub twice_rapidly: bool,
    /// Custom double-press window; `None` uses the manager's setting
    pub double_press_window: Option<Duration>,
    pub within: Option<String>,
    pub allow_in_forms: bool,
}

impl fmt::Display for ShortcutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.keys.join("+"), self.action)?;

        let mut flags = Vec::new();
        if self.once {
            flags.push("once".to_string());
        }
        if self.twice_rapidly {
            flags.push(match self.double_press_window {
                Some(window) => format!("twice within {}ms", window.as_millis()),
                None => "twice".to_string(),
            });
        }
        if let Some(ref scope) = self.within {
            flags.push(format!("within {}", scope));
        }
        if self.allow_in_forms {
            flags.push("in forms".to_string());
        }

        if !flags.is_empty() {
            write!(f, " ({})", flags.join(", "))?;
        }
        Ok(())
    }
}

/// What a shortcut installed by [`install`] reports to its action callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutAction {
    Matched { action: String, keys: Vec<String> },
    Released { action: String },
}

/// Load shortcuts from a YAML file
pub fn load_shortcuts_file(path: &Path) -> Result<Vec<ShortcutSpec>, ShortcutFileError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ShortcutFileError::IoError(e.to_string()))?;

    parse_shortcuts_yaml(&content)
}

/// Parse shortcuts from a YAML string
///
/// Ungrouped bindings come first, then each group's bindings in file order.
pub fn parse_shortcuts_yaml(yaml: &str) -> Result<Vec<ShortcutSpec>, ShortcutFileError> {
    let file: ShortcutFile =
        serde_yaml::from_str(yaml).map_err(|e| ShortcutFileError::ParseError(e.to_string()))?;

    let mut specs = Vec::new();

    for entry in file.bindings {
        specs.push(build_spec(&[], entry)?);
    }

    for group in file.groups {
        let modifiers = parse_keys_field(&group.modifiers)?;
        for entry in group.bindings {
            specs.push(build_spec(&modifiers, entry)?);
        }
    }

    Ok(specs)
}

fn build_spec(
    modifiers: &[String],
    entry: ShortcutEntry,
) -> Result<ShortcutSpec, ShortcutFileError> {
    let mut keys = modifiers.to_vec();
    keys.extend(parse_keys_field(&entry.keys)?);

    if entry.action.trim().is_empty() {
        return Err(ShortcutFileError::InvalidKeys(format!(
            "Missing action for {}",
            keys.join("+")
        )));
    }

    let (twice_rapidly, double_press_window) = match entry.twice_rapidly {
        None | Some(DoublePressField::Enabled(false)) => (false, None),
        Some(DoublePressField::Enabled(true)) => (true, None),
        Some(DoublePressField::WindowMs(ms)) => (true, Some(Duration::from_millis(ms))),
    };

    Ok(ShortcutSpec {
        keys,
        action: entry.action,
        once: entry.once,
        twice_rapidly,
        double_press_window,
        within: entry.within,
        allow_in_forms: entry.allow_in_forms,
    })
}

fn parse_keys_field(field: &KeysField) -> Result<Vec<String>, ShortcutFileError> {
    match field {
        KeysField::Combo(combo) => parse_combo(combo),
        KeysField::List(keys) => {
            if keys.is_empty() || keys.iter().any(|k| k.is_empty()) {
                return Err(ShortcutFileError::InvalidKeys(format!(
                    "Empty key in list: {:?}",
                    keys
                )));
            }
            Ok(keys.clone())
        }
    }
}

/// Split a combination like `"Control+Shift+k"` into key tokens
///
/// A trailing `++` names the plus key itself: `"Control++"` is
/// `["Control", "+"]`. Key names are kept exactly as written.
pub fn parse_combo(combo: &str) -> Result<Vec<String>, ShortcutFileError> {
    let trimmed = combo.trim();
    if trimmed == "+" {
        return Ok(vec!["+".to_string()]);
    }

    let (body, plus_key) = match trimmed.strip_suffix("++") {
        Some(body) => (body, true),
        None => (trimmed, false),
    };

    let mut keys = Vec::new();
    for part in body.split('+') {
        let part = part.trim();
        if part.is_empty() {
            return Err(ShortcutFileError::InvalidKeys(format!(
                "Empty key in combination: {}",
                combo
            )));
        }
        keys.push(part.to_string());
    }
    if plus_key {
        keys.push("+".to_string());
    }

    Ok(keys)
}

/// Register every spec on `manager`, routing matches and releases to `on_action`
pub fn install<F>(manager: &Manager, specs: &[ShortcutSpec], on_action: F) -> Vec<Binding>
where
    F: Fn(&ShortcutAction) + 'static,
{
    let on_action = Rc::new(on_action);

    specs
        .iter()
        .map(|spec| {
            let mut binding = manager.register(spec.keys.iter().cloned());

            if spec.once {
                binding = binding.once();
            }
            if spec.twice_rapidly {
                binding = match spec.double_press_window {
                    Some(window) => binding.twice_rapidly_within(window),
                    None => binding.twice_rapidly(),
                };
            }
            if let Some(ref scope) = spec.within {
                binding = binding.within(scope.as_str());
            }
            if spec.allow_in_forms {
                binding = binding.allow_in_forms();
            }

            let matched = Rc::clone(&on_action);
            let action = spec.action.clone();
            binding = binding.then(move |event| {
                matched(&ShortcutAction::Matched {
                    action: action.clone(),
                    keys: event.keys.clone(),
                })
            });

            let released = Rc::clone(&on_action);
            let action = spec.action.clone();
            binding.when_released(move |_| {
                released(&ShortcutAction::Released {
                    action: action.clone(),
                })
            })
        })
        .collect()
}

/// Errors that can occur when loading shortcut files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutFileError {
    IoError(String),
    ParseError(String),
    InvalidKeys(String),
}

impl fmt::Display for ShortcutFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortcutFileError::IoError(e) => write!(f, "IO error: {}", e),
            ShortcutFileError::ParseError(e) => write!(f, "Parse error: {}", e),
            ShortcutFileError::InvalidKeys(k) => write!(f, "Invalid keys: {}", k),
        }
    }
}

impl std::error::Error for ShortcutFileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combo_simple() {
        assert_eq!(parse_combo("a").unwrap(), vec!["a"]);
        assert_eq!(
            parse_combo("Control+Shift+k").unwrap(),
            vec!["Control", "Shift", "k"]
        );
    }

    #[test]
    fn test_parse_combo_keeps_names_as_written() {
        assert_eq!(parse_combo(" Meta + K ").unwrap(), vec!["Meta", "K"]);
    }

    #[test]
    fn test_parse_combo_plus_key() {
        assert_eq!(parse_combo("+").unwrap(), vec!["+"]);
        assert_eq!(parse_combo("Control++").unwrap(), vec!["Control", "+"]);
    }

    #[test]
    fn test_parse_combo_rejects_empty_parts() {
        assert!(matches!(
            parse_combo(""),
            Err(ShortcutFileError::InvalidKeys(_))
        ));
        assert!(parse_combo("Control++a").is_err());
        assert!(parse_combo("a+").is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
bindings:
  - keys: "Control+s"
    action: save
  - keys: [Escape]
    action: close
    once: true
"#;

        let specs = parse_shortcuts_yaml(yaml).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].keys, vec!["Control", "s"]);
        assert_eq!(specs[0].action, "save");
        assert!(!specs[0].once);
        assert_eq!(specs[1].keys, vec!["Escape"]);
        assert!(specs[1].once);
    }

    #[test]
    fn test_parse_yaml_double_press_forms() {
        let yaml = r#"
bindings:
  - keys: a
    action: default-window
    twice_rapidly: true
  - keys: b
    action: custom-window
    twice_rapidly: 300
  - keys: c
    action: disabled
    twice_rapidly: false
"#;

        let specs = parse_shortcuts_yaml(yaml).unwrap();
        assert!(specs[0].twice_rapidly);
        assert_eq!(specs[0].double_press_window, None);
        assert!(specs[1].twice_rapidly);
        assert_eq!(
            specs[1].double_press_window,
            Some(Duration::from_millis(300))
        );
        assert!(!specs[2].twice_rapidly);
    }

    #[test]
    fn test_parse_yaml_groups_prefix_modifiers() {
        let yaml = r#"
bindings:
  - keys: F1
    action: help
groups:
  - modifiers: [Alt, Shift]
    bindings:
      - keys: "1"
        action: tab-1
      - keys: "2"
        action: tab-2
"#;

        let specs = parse_shortcuts_yaml(yaml).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].keys, vec!["F1"]);
        assert_eq!(specs[1].keys, vec!["Alt", "Shift", "1"]);
        assert_eq!(specs[2].keys, vec!["Alt", "Shift", "2"]);
    }

    #[test]
    fn test_parse_yaml_errors() {
        assert!(matches!(
            parse_shortcuts_yaml("bindings: 12"),
            Err(ShortcutFileError::ParseError(_))
        ));
        assert!(matches!(
            parse_shortcuts_yaml("bindings:\n  - keys: []\n    action: x\n"),
            Err(ShortcutFileError::InvalidKeys(_))
        ));
        assert!(matches!(
            parse_shortcuts_yaml("bindings:\n  - keys: a\n    action: ''\n"),
            Err(ShortcutFileError::InvalidKeys(_))
        ));
    }

    #[test]
    fn test_spec_display() {
        let specs = parse_shortcuts_yaml(
            "bindings:\n  - keys: Control+k\n    action: palette\n    once: true\n    twice_rapidly: 250\n",
        )
        .unwrap();
        assert_eq!(
            specs[0].to_string(),
            "Control+k => palette (once, twice within 250ms)"
        );
    }
}
