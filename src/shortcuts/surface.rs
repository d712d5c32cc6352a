//! Focus and element-tree queries used for scoped bindings
//!
//! The engine never walks a real DOM. Hosts implement [`Surface`] over
//! whatever UI tree they have; [`ElementTree`] is an in-memory implementation
//! for headless hosts and tests.

use std::cell::{Cell, RefCell};

/// Opaque reference to an element of the host surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Queries the binding engine needs from the host's UI tree
pub trait Surface {
    /// Element currently holding input focus
    fn focused_element(&self) -> Option<ElementId>;

    /// Whether `element` is `scope` or one of its descendants
    fn is_within(&self, element: ElementId, scope: ElementId) -> bool;

    /// Whether `element` accepts text input (edit field, text area, select)
    fn is_form_control(&self, element: ElementId) -> bool;

    /// First element matching `selector`, in document order
    fn query_selector(&self, selector: &str) -> Option<ElementId>;
}

/// Where a binding is allowed to match
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// A direct element reference
    Element(ElementId),
    /// A selector, resolved once when the scope is applied
    Selector(String),
}

impl From<ElementId> for Scope {
    fn from(element: ElementId) -> Self {
        Scope::Element(element)
    }
}

impl From<&str> for Scope {
    fn from(selector: &str) -> Self {
        Scope::Selector(selector.to_string())
    }
}

impl From<String> for Scope {
    fn from(selector: String) -> Self {
        Scope::Selector(selector)
    }
}

const FORM_TAGS: [&str; 3] = ["input", "textarea", "select"];

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    content_editable: bool,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// In-memory element tree with a single root and focus tracking
#[derive(Debug)]
pub struct ElementTree {
    nodes: RefCell<Vec<Node>>,
    focused: Cell<Option<ElementId>>,
}

impl ElementTree {
    /// Create a tree holding only a `body` root element
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![Node {
                tag: "body".to_string(),
                id: None,
                classes: Vec::new(),
                content_editable: false,
                parent: None,
                children: Vec::new(),
            }]),
            focused: Cell::new(None),
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Append a new element with the given tag as the last child of `parent`
    pub fn append(&self, parent: ElementId, tag: &str) -> ElementId {
        let mut nodes = self.nodes.borrow_mut();
        let id = ElementId(nodes.len());
        nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            content_editable: false,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    pub fn set_id(&self, element: ElementId, id: &str) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(element.0) {
            node.id = Some(id.to_string());
        }
    }

    pub fn add_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(element.0) {
            node.classes.push(class.to_string());
        }
    }

    pub fn set_content_editable(&self, element: ElementId, editable: bool) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(element.0) {
            node.content_editable = editable;
        }
    }

    pub fn focus(&self, element: ElementId) {
        self.focused.set(Some(element));
    }

    pub fn blur(&self) {
        self.focused.set(None);
    }

    /// Number of elements, root included
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matches(node: &Node, selector: &CompoundSelector) -> bool {
        if let Some(ref tag) = selector.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(ref id) = selector.id {
            if node.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        selector
            .classes
            .iter()
            .all(|class| node.classes.iter().any(|c| c == class))
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for ElementTree {
    fn focused_element(&self) -> Option<ElementId> {
        self.focused.get()
    }

    fn is_within(&self, element: ElementId, scope: ElementId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(element);
        while let Some(id) = current {
            if id == scope {
                return true;
            }
            current = nodes.get(id.0).and_then(|n| n.parent);
        }
        false
    }

    fn is_form_control(&self, element: ElementId) -> bool {
        let nodes = self.nodes.borrow();
        let Some(node) = nodes.get(element.0) else {
            return false;
        };
        node.content_editable || FORM_TAGS.contains(&node.tag.as_str())
    }

    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let selector = CompoundSelector::parse(selector)?;
        let nodes = self.nodes.borrow();

        // Pre-order walk so the first hit is the first element in document order
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = nodes.get(id.0)?;
            if Self::matches(node, &selector) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }
}

/// A single compound selector: `tag`, `#id`, `.class`, or a combination
/// such as `div#main.panel`
#[derive(Debug, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl CompoundSelector {
    fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() || selector.contains(char::is_whitespace) {
            return None;
        }

        let mut parsed = CompoundSelector::default();
        let mut rest = selector;

        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_end > 0 {
            parsed.tag = Some(rest[..tag_end].to_string());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match marker {
                '#' => parsed.id = Some(name.to_string()),
                _ => parsed.classes.push(name.to_string()),
            }
            rest = &body[end..];
        }

        Some(parsed)
    }
}
