//! Binding: one watched key combination and its matching state machine
//!
//! A binding records which of its watched keys are held, and fires its match
//! handler on the key-down that makes the held set equal the watched set.
//! Once every key is released after a match, the release handler fires.
//!
//! Builder methods consume and return the handle, so a binding is usually
//! configured in one chain:
//!
//! ```ignore
//! manager
//!     .register(["Control", "k"])
//!     .once()
//!     .then(|e| println!("pressed {:?}", e.keys))
//!     .when_released(|_| println!("released"));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::events::{KeyEvent, KeyEventKind, ListenerId};
use super::manager::{Manager, ManagerInner};
use super::plugins::{is_vetoed, Hook};
use super::surface::{ElementId, Scope};

/// Window used by [`Binding::twice_rapidly`] unless settings say otherwise
pub const DEFAULT_DOUBLE_PRESS_WINDOW: Duration = Duration::from_millis(500);

/// Identity of a binding within its manager
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingStatus {
    Active,
    /// Terminal: no further matching, no event subscriptions
    Stopped,
}

/// Payload handed to the match handler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchEvent {
    /// Keys held at the moment of the match, in the order they went down
    pub keys: Vec<String>,
    /// The key-down that completed the combination
    pub event: KeyEvent,
}

/// Payload handed to the release handler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseEvent {
    /// The binding's watched keys
    pub keys: Vec<String>,
    /// The key-up that released the last held key
    pub event: KeyEvent,
}

type MatchHandler = Rc<dyn Fn(&MatchEvent)>;
type ReleaseHandler = Rc<dyn Fn(&ReleaseEvent)>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum ScopeTarget {
    Element(ElementId),
    /// Selector that matched nothing when applied; the binding can never match
    Unresolved(String),
}

/// A held key, remembered with the physical code it went down with
///
/// Modifiers can change the logical key between press and release
/// (`Shift↓ A↓ Shift↑ a↑`), so the code is what identifies the release.
#[derive(Clone, Debug)]
struct HeldKey {
    token: String,
    code: Option<String>,
}

impl HeldKey {
    fn from_event(token: String, event: &KeyEvent) -> Self {
        Self {
            token,
            code: event.code.clone(),
        }
    }

    fn released_by(&self, event: &KeyEvent) -> bool {
        match (&self.code, &event.code) {
            (Some(held), Some(code)) => held == code,
            _ => event.names(&self.token),
        }
    }
}

struct BindingState {
    watched: Vec<String>,
    /// Watched keys currently held, without duplicates
    pressed: Vec<HeldKey>,
    /// Unwatched keys currently held; any of these blocks a match
    foreign: Vec<HeldKey>,
    fire_once: bool,
    require_double_press: bool,
    double_press_window: Duration,
    scope: Option<ScopeTarget>,
    include_form_targets: bool,
    pending_presses: u8,
    matched_count: u64,
    acknowledged_releases: u64,
    on_match: Option<MatchHandler>,
    on_release: Option<ReleaseHandler>,
    listeners: Vec<ListenerId>,
    status: BindingStatus,
}

/// Handle to a registered key combination
///
/// Clones share the same state; dropping a handle does not stop the binding.
#[derive(Clone)]
pub struct Binding {
    id: BindingId,
    state: Rc<RefCell<BindingState>>,
    manager: Weak<ManagerInner>,
}

impl Binding {
    pub(crate) fn new(id: BindingId, watched: Vec<String>, manager: &Manager) -> Self {
        let settings = manager.settings();
        Self {
            id,
            state: Rc::new(RefCell::new(BindingState {
                watched,
                pressed: Vec::new(),
                foreign: Vec::new(),
                fire_once: false,
                require_double_press: false,
                double_press_window: settings.double_press_window(),
                scope: None,
                include_form_targets: settings.include_form_targets,
                pending_presses: 0,
                matched_count: 0,
                acknowledged_releases: 0,
                on_match: None,
                on_release: None,
                listeners: Vec::new(),
                status: BindingStatus::Active,
            })),
            manager: manager.downgrade(),
        }
    }

    fn manager(&self) -> Option<Manager> {
        self.manager.upgrade().map(Manager::from_inner)
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    /// The combination this binding waits for, in declaration order
    pub fn watched_keys(&self) -> Vec<String> {
        self.state.borrow().watched.clone()
    }

    /// Watched keys currently held, in key-down order
    pub fn pressed_keys(&self) -> Vec<String> {
        self.state.borrow().pressed_tokens()
    }

    pub fn status(&self) -> BindingStatus {
        self.state.borrow().status
    }

    pub fn is_active(&self) -> bool {
        self.status() == BindingStatus::Active
    }

    /// Number of successful matches since registration
    pub fn matched_count(&self) -> u64 {
        self.state.borrow().matched_count
    }

    pub fn fires_once(&self) -> bool {
        self.state.borrow().fire_once
    }

    pub fn requires_double_press(&self) -> bool {
        self.state.borrow().require_double_press
    }

    pub fn double_press_window(&self) -> Duration {
        self.state.borrow().double_press_window
    }

    pub fn includes_form_targets(&self) -> bool {
        self.state.borrow().include_form_targets
    }

    pub fn is_scoped(&self) -> bool {
        self.state.borrow().scope.is_some()
    }

    // === Builder modifiers ===

    /// Stop the binding after its first successful match
    pub fn once(self) -> Self {
        self.state.borrow_mut().fire_once = true;
        self
    }

    /// Only match on the second full press within the current window
    ///
    /// Auto-repeat of a held key is not a second press: only a key-down for a
    /// key that was up counts toward the pair.
    pub fn twice_rapidly(self) -> Self {
        self.state.borrow_mut().require_double_press = true;
        self
    }

    /// Only match on the second full press within `window`
    pub fn twice_rapidly_within(self, window: Duration) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.require_double_press = true;
            state.double_press_window = window;
        }
        self
    }

    /// Only match while the event originates inside `scope`
    ///
    /// Selectors are resolved now, against the manager's surface. A selector
    /// matching nothing leaves the binding unable to match.
    pub fn within(self, scope: impl Into<Scope>) -> Self {
        let target = match scope.into() {
            Scope::Element(element) => ScopeTarget::Element(element),
            Scope::Selector(selector) => {
                let resolved = self
                    .manager()
                    .and_then(|m| m.surface().query_selector(&selector));
                match resolved {
                    Some(element) => ScopeTarget::Element(element),
                    None => {
                        tracing::debug!(binding = %self, %selector, "scope selector matched nothing");
                        ScopeTarget::Unresolved(selector)
                    }
                }
            }
        };
        self.state.borrow_mut().scope = Some(target);
        self
    }

    /// Also match while a text input, text area or select holds focus
    pub fn allow_in_forms(self) -> Self {
        self.state.borrow_mut().include_form_targets = true;
        self
    }

    /// Attach the match handler and start listening for key events
    ///
    /// Every call subscribes again, so calling this twice runs the state
    /// machine twice per event.
    pub fn then(self, handler: impl Fn(&MatchEvent) + 'static) -> Self {
        let Some(manager) = self.manager() else {
            tracing::warn!(binding = %self, "manager dropped, binding cannot listen");
            return self;
        };
        if !self.is_active() {
            tracing::debug!(binding = %self, "ignoring handler for stopped binding");
            return self;
        }

        self.state.borrow_mut().on_match = Some(Rc::new(handler));

        let down = self.clone();
        let down_id = manager
            .events()
            .subscribe(KeyEventKind::Down, move |event| down.handle_key_down(event));
        let up = self.clone();
        let up_id = manager
            .events()
            .subscribe(KeyEventKind::Up, move |event| up.handle_key_up(event));

        self.state.borrow_mut().listeners.extend([down_id, up_id]);
        self
    }

    /// Alias for [`Binding::then`]
    pub fn run(self, handler: impl Fn(&MatchEvent) + 'static) -> Self {
        self.then(handler)
    }

    /// Attach the handler fired once all keys are up after a match
    pub fn when_released(self, handler: impl Fn(&ReleaseEvent) + 'static) -> Self {
        self.state.borrow_mut().on_release = Some(Rc::new(handler));
        self
    }

    /// Unsubscribe from key events and leave the manager's registry
    ///
    /// Stopping twice is harmless.
    pub fn stop(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if state.status == BindingStatus::Stopped {
                return;
            }
            state.status = BindingStatus::Stopped;
            std::mem::take(&mut state.listeners)
        };

        tracing::debug!(binding = %self, "binding stopped");

        if let Some(manager) = self.manager() {
            for id in listeners {
                manager.events().unsubscribe(id);
            }
            manager.child_stopped(self);
        }
    }

    // === Event handling ===

    fn handle_key_down(&self, event: &KeyEvent) {
        let Some(manager) = self.manager() else {
            return;
        };

        let Some(fresh) = self.record_key_down(event) else {
            return;
        };
        if !self.accepts_origin(&manager, event) {
            tracing::trace!(binding = %self, key = %event.key, "event outside scope");
            return;
        }
        if !self.combination_held() {
            return;
        }
        if !self.passes_double_press_gate(&manager, fresh) {
            return;
        }

        let responses = manager
            .plugins()
            .handle(Hook::BeforeBindingHandled(self), &manager);
        if is_vetoed(&responses) {
            tracing::debug!(binding = %self, "match vetoed by plugin");
            self.state.borrow_mut().pending_presses = 0;
            return;
        }

        let (handler, keys) = {
            let state = self.state.borrow();
            (state.on_match.clone(), state.pressed_tokens())
        };
        tracing::debug!(binding = %self, ?keys, "binding matched");
        if let Some(handler) = handler {
            handler(&MatchEvent {
                keys,
                event: event.clone(),
            });
        }

        {
            let mut state = self.state.borrow_mut();
            state.pending_presses = 0;
            state.matched_count += 1;
        }

        manager
            .plugins()
            .handle(Hook::AfterBindingHandled(self), &manager);

        if self.fires_once() {
            self.stop();
        }
    }

    /// Record the key as held
    ///
    /// Returns `None` if the key is not part of the combination, otherwise
    /// whether it was up before this event.
    fn record_key_down(&self, event: &KeyEvent) -> Option<bool> {
        let mut state = self.state.borrow_mut();
        if state.status == BindingStatus::Stopped {
            return None;
        }

        let token = match event.code {
            Some(ref code) if state.watched.contains(code) => Some(code.clone()),
            _ if state.watched.contains(&event.key) => Some(event.key.clone()),
            _ => None,
        };

        match token {
            Some(token) => {
                // Key repeat delivers extra downs for a held key; keep one entry
                if state.pressed.iter().any(|held| held.token == token) {
                    return Some(false);
                }
                state.pressed.push(HeldKey::from_event(token, event));
                Some(true)
            }
            None => {
                if !state.foreign.iter().any(|held| held.released_by(event)) {
                    state
                        .foreign
                        .push(HeldKey::from_event(event.key.clone(), event));
                }
                None
            }
        }
    }

    fn accepts_origin(&self, manager: &Manager, event: &KeyEvent) -> bool {
        let (scope, include_form_targets) = {
            let state = self.state.borrow();
            (state.scope.clone(), state.include_form_targets)
        };
        let surface = manager.surface();
        let origin = event.target.or_else(|| surface.focused_element());

        match scope {
            None => {}
            Some(ScopeTarget::Unresolved(selector)) => {
                tracing::trace!(binding = %self, %selector, "scope never resolved");
                return false;
            }
            Some(ScopeTarget::Element(scope)) => match origin {
                Some(origin) if surface.is_within(origin, scope) => {}
                _ => return false,
            },
        }

        if include_form_targets {
            return true;
        }
        !origin.is_some_and(|origin| surface.is_form_control(origin))
    }

    fn combination_held(&self) -> bool {
        let state = self.state.borrow();
        state.foreign.is_empty() && same_members(&state.pressed_tokens(), &state.watched)
    }

    fn passes_double_press_gate(&self, manager: &Manager, fresh: bool) -> bool {
        let window = {
            let mut state = self.state.borrow_mut();
            if !state.require_double_press {
                return true;
            }
            if !fresh {
                return false;
            }
            state.pending_presses += 1;
            if state.pending_presses >= 2 {
                return true;
            }
            state.double_press_window
        };

        let state = Rc::downgrade(&self.state);
        manager.scheduler().schedule(
            window,
            Box::new(move || {
                let Some(state) = state.upgrade() else {
                    return;
                };
                let mut state = state.borrow_mut();
                if state.status == BindingStatus::Active {
                    state.pending_presses = 0;
                }
            }),
        );
        false
    }

    fn handle_key_up(&self, event: &KeyEvent) {
        let (handler, keys) = {
            let mut state = self.state.borrow_mut();
            if state.status == BindingStatus::Stopped {
                return;
            }

            state.pressed.retain(|held| !held.released_by(event));
            state.foreign.retain(|held| !held.released_by(event));

            if !state.pressed.is_empty() {
                return;
            }
            // Only a fresh, unacknowledged match counts as a release
            if state.matched_count <= state.acknowledged_releases {
                return;
            }
            state.acknowledged_releases = state.matched_count;
            (state.on_release.clone(), state.watched.clone())
        };

        tracing::debug!(binding = %self, "binding released");
        if let Some(handler) = handler {
            handler(&ReleaseEvent {
                keys,
                event: event.clone(),
            });
        }
    }
}

impl BindingState {
    fn pressed_tokens(&self) -> Vec<String> {
        self.pressed.iter().map(|held| held.token.clone()).collect()
    }
}

/// Set equality: every element of one slice appears in the other
///
/// `pressed` never holds duplicates, so this also fixes its cardinality.
fn same_members(pressed: &[String], watched: &[String]) -> bool {
    pressed.iter().all(|k| watched.contains(k)) && watched.iter().all(|k| pressed.contains(k))
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state.borrow().watched.join("+"))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("watched", &state.watched)
            .field("pressed", &state.pressed_tokens())
            .field("status", &state.status)
            .field("matched_count", &state.matched_count)
            .finish()
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Binding {}
