//! Key events and the listener registry that fans them out to bindings

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::surface::ElementId;

/// Which half of a keystroke an event describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Down,
    Up,
}

/// A single key notification delivered by the host
///
/// `key` is the logical key value (`"a"`, `"Shift"`, `"ArrowUp"`), `code` the
/// physical key (`"KeyA"`, `"ShiftLeft"`) when the host knows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub code: Option<String>,
    /// Element the event originated from, if the host tracks one
    pub target: Option<ElementId>,
}

impl KeyEvent {
    /// Create an event carrying only a logical key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: None,
            target: None,
        }
    }

    /// Create an event carrying both the logical key and the physical code
    pub fn with_code(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: Some(code.into()),
            target: None,
        }
    }

    /// Set the originating element (builder pattern)
    pub fn targeting(mut self, element: ElementId) -> Self {
        self.target = Some(element);
        self
    }

    /// Whether `token` names this event, either by key or by code
    pub fn names(&self, token: &str) -> bool {
        self.key == token || self.code.as_deref() == Some(token)
    }
}

/// Handle returned by [`EventSource::subscribe`], used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&KeyEvent)>;

struct Subscription {
    id: ListenerId,
    kind: KeyEventKind,
    listener: Listener,
}

/// Ordered registry of key listeners
///
/// Dispatch works on a snapshot: listeners removed while an event is being
/// delivered are skipped, listeners added during delivery only see later events.
#[derive(Default)]
pub struct EventSource {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl EventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of key event
    pub fn subscribe(
        &self,
        kind: KeyEventKind,
        listener: impl Fn(&KeyEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            id,
            kind,
            listener: Rc::new(listener),
        });
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.subscriptions.borrow_mut().retain(|s| s.id != id);
    }

    /// Whether the listener is still registered
    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.subscriptions.borrow().iter().any(|s| s.id == id)
    }

    /// Number of listeners for the given kind
    pub fn listener_count(&self, kind: KeyEventKind) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }

    /// Deliver an event to every listener of its kind, in subscription order
    pub fn dispatch(&self, kind: KeyEventKind, event: &KeyEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| (s.id, Rc::clone(&s.listener)))
            .collect();

        for (id, listener) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("down", &self.listener_count(KeyEventKind::Down))
            .field("up", &self.listener_count(KeyEventKind::Up))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_key_or_code() {
        let event = KeyEvent::with_code("a", "KeyA");
        assert!(event.names("a"));
        assert!(event.names("KeyA"));
        assert!(!event.names("b"));
    }

    #[test]
    fn test_dispatch_by_kind() {
        let source = EventSource::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let down = Rc::clone(&seen);
        source.subscribe(KeyEventKind::Down, move |e| {
            down.borrow_mut().push(format!("down {}", e.key))
        });
        let up = Rc::clone(&seen);
        source.subscribe(KeyEventKind::Up, move |e| {
            up.borrow_mut().push(format!("up {}", e.key))
        });

        source.dispatch(KeyEventKind::Down, &KeyEvent::new("a"));
        source.dispatch(KeyEventKind::Up, &KeyEvent::new("a"));

        assert_eq!(*seen.borrow(), vec!["down a", "up a"]);
    }

    #[test]
    fn test_unsubscribed_listener_not_called() {
        let source = EventSource::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = source.subscribe(KeyEventKind::Down, move |_| c.set(c.get() + 1));

        source.unsubscribe(id);
        source.dispatch(KeyEventKind::Down, &KeyEvent::new("a"));

        assert_eq!(count.get(), 0);
        assert!(!source.is_subscribed(id));
    }

    #[test]
    fn test_listener_removed_during_dispatch_is_skipped() {
        let source = Rc::new(EventSource::new());
        let count = Rc::new(Cell::new(0));

        let second_id = Rc::new(Cell::new(None));
        let s = Rc::clone(&source);
        let target = Rc::clone(&second_id);
        source.subscribe(KeyEventKind::Down, move |_| {
            if let Some(id) = target.get() {
                s.unsubscribe(id);
            }
        });
        let c = Rc::clone(&count);
        let id = source.subscribe(KeyEventKind::Down, move |_| c.set(c.get() + 1));
        second_id.set(Some(id));

        source.dispatch(KeyEventKind::Down, &KeyEvent::new("a"));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_listener_added_during_dispatch_waits_for_next_event() {
        let source = Rc::new(EventSource::new());
        let count = Rc::new(Cell::new(0));

        let s = Rc::clone(&source);
        let c = Rc::clone(&count);
        source.subscribe(KeyEventKind::Down, move |_| {
            let c = Rc::clone(&c);
            s.subscribe(KeyEventKind::Down, move |_| c.set(c.get() + 1));
        });

        source.dispatch(KeyEventKind::Down, &KeyEvent::new("a"));
        assert_eq!(count.get(), 0);
        source.dispatch(KeyEventKind::Down, &KeyEvent::new("a"));
        assert_eq!(count.get(), 1);
    }
}
