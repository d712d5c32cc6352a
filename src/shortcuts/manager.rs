//! Manager: registry of live bindings and owner of the shared plugin dispatcher

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::binding::{Binding, BindingId};
use super::events::{EventSource, KeyEvent, KeyEventKind};
use super::plugins::{Hook, Plugin, PluginDispatcher, WithOptions};
use super::scheduler::Scheduler;
use super::surface::Surface;
use crate::config::Settings;

/// One or more key tokens, accepted wherever a single key or a list will do
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyList(pub Vec<String>);

impl From<&str> for KeyList {
    fn from(key: &str) -> Self {
        KeyList(vec![key.to_string()])
    }
}

impl From<String> for KeyList {
    fn from(key: String) -> Self {
        KeyList(vec![key])
    }
}

impl<S: Into<String>> From<Vec<S>> for KeyList {
    fn from(keys: Vec<S>) -> Self {
        KeyList(keys.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for KeyList {
    fn from(keys: [S; N]) -> Self {
        KeyList(keys.into_iter().map(Into::into).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for KeyList {
    fn from(keys: &[S]) -> Self {
        KeyList(keys.iter().map(|k| k.as_ref().to_string()).collect())
    }
}

pub(crate) struct ManagerInner {
    bindings: RefCell<Vec<Binding>>,
    group_modifiers: RefCell<Vec<String>>,
    plugins: PluginDispatcher,
    events: EventSource,
    surface: Rc<dyn Surface>,
    scheduler: Rc<dyn Scheduler>,
    settings: Settings,
    next_binding_id: Cell<u64>,
}

/// Owns the live bindings, the plugin dispatcher and the key event source
///
/// A `Manager` is a cheap handle; clones share the same registry. Hosts feed
/// key notifications through [`Manager::key_down`] and [`Manager::key_up`].
#[derive(Clone)]
pub struct Manager {
    inner: Rc<ManagerInner>,
}

impl Manager {
    /// Create a manager with default settings
    pub fn new(surface: Rc<dyn Surface>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_settings(Settings::default(), surface, scheduler)
    }

    pub fn with_settings(
        settings: Settings,
        surface: Rc<dyn Surface>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                bindings: RefCell::new(Vec::new()),
                group_modifiers: RefCell::new(Vec::new()),
                plugins: PluginDispatcher::new(),
                events: EventSource::new(),
                surface,
                scheduler,
                settings,
                next_binding_id: Cell::new(0),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ManagerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ManagerInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn surface(&self) -> &dyn Surface {
        self.inner.surface.as_ref()
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.inner.scheduler.as_ref()
    }

    pub fn events(&self) -> &EventSource {
        &self.inner.events
    }

    pub fn plugins(&self) -> &PluginDispatcher {
        &self.inner.plugins
    }

    // === Registration ===

    /// Register a binding for `keys`, prefixed by any active group modifiers
    ///
    /// The returned binding does nothing until [`Binding::then`] is called.
    pub fn register<I, S>(&self, keys: I) -> Binding
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut watched = self.inner.group_modifiers.borrow().clone();
        watched.extend(keys.into_iter().map(Into::into));

        let id = BindingId(self.inner.next_binding_id.get());
        self.inner.next_binding_id.set(id.0 + 1);

        let binding = Binding::new(id, watched, self);
        self.inner.bindings.borrow_mut().push(binding.clone());
        tracing::debug!(binding = %binding, "binding registered");

        self.inner
            .plugins
            .handle(Hook::BindingRegistered(&binding), self);
        binding
    }

    /// Run `f` with `modifiers` prefixed to every registration it makes
    ///
    /// The prefix is replaced, not extended, by a nested call and cleared on
    /// return. Use [`Manager::scoped`] when groups need to nest.
    pub fn group(&self, modifiers: impl Into<KeyList>, f: impl FnOnce(&Manager)) {
        *self.inner.group_modifiers.borrow_mut() = modifiers.into().0;
        f(self);
        self.inner.group_modifiers.borrow_mut().clear();
    }

    /// A registrar that prefixes `modifiers` to everything it registers
    pub fn scoped(&self, modifiers: impl Into<KeyList>) -> Group {
        Group {
            manager: self.clone(),
            modifiers: modifiers.into().0,
        }
    }

    /// Modifiers currently prefixed by [`Manager::group`]
    pub fn group_modifiers(&self) -> Vec<String> {
        self.inner.group_modifiers.borrow().clone()
    }

    // === Introspection and lifecycle ===

    /// Watched keys of every live binding, in registration order
    pub fn bindings(&self) -> Vec<Vec<String>> {
        self.inner
            .bindings
            .borrow()
            .iter()
            .map(Binding::watched_keys)
            .collect()
    }

    /// Handles to every live binding, in registration order
    pub fn live_bindings(&self) -> Vec<Binding> {
        self.inner.bindings.borrow().clone()
    }

    /// Stop every live binding and empty the registry
    pub fn stop_all(&self) {
        let bindings = self.live_bindings();
        for binding in &bindings {
            binding.stop();
        }
        self.inner.bindings.borrow_mut().clear();

        tracing::debug!(count = bindings.len(), "all bindings stopped");
        self.inner.plugins.handle(Hook::AllBindingsStopped, self);
    }

    /// Called by a binding's own stop path
    pub(crate) fn child_stopped(&self, binding: &Binding) {
        self.inner
            .bindings
            .borrow_mut()
            .retain(|b| b.id() != binding.id());
        self.inner
            .plugins
            .handle(Hook::BindingStopped(binding), self);
    }

    // === Plugins ===

    pub fn use_plugin(&self, plugin: impl Plugin + 'static) {
        self.use_plugins([Rc::new(plugin) as Rc<dyn Plugin>]);
    }

    /// Add several plugins at once; the same `Rc` may appear more than once
    pub fn use_plugins<I>(&self, plugins: I)
    where
        I: IntoIterator<Item = Rc<dyn Plugin>>,
    {
        self.inner.plugins.add(plugins, self);
    }

    /// Drop every plugin without touching live bindings
    pub fn flush_plugins(&self) {
        self.inner.plugins.flush();
    }

    /// Pair a plugin with the options its hooks read
    pub fn plugin_with_options<P, O>(plugin: P, options: O) -> WithOptions<P, O> {
        WithOptions::new(plugin, options)
    }

    // === Host input ===

    pub fn key_down(&self, event: &KeyEvent) {
        tracing::trace!(key = %event.key, code = ?event.code, "key down");
        self.inner.events.dispatch(KeyEventKind::Down, event);
    }

    pub fn key_up(&self, event: &KeyEvent) {
        tracing::trace!(key = %event.key, code = ?event.code, "key up");
        self.inner.events.dispatch(KeyEventKind::Up, event);
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("bindings", &self.bindings())
            .field("group_modifiers", &self.inner.group_modifiers.borrow())
            .field("plugins", &self.inner.plugins)
            .field("events", &self.inner.events)
            .finish()
    }
}

/// Registrar returned by [`Manager::scoped`]
///
/// Unlike [`Manager::group`], nesting stacks the prefixes.
#[derive(Clone, Debug)]
pub struct Group {
    manager: Manager,
    modifiers: Vec<String>,
}

impl Group {
    pub fn register<I, S>(&self, keys: I) -> Binding
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let combined = self
            .modifiers
            .iter()
            .cloned()
            .chain(keys.into_iter().map(Into::into));
        self.manager.register(combined)
    }

    /// A nested group requiring this group's modifiers plus `modifiers`
    pub fn group(&self, modifiers: impl Into<KeyList>) -> Group {
        let mut stacked = self.modifiers.clone();
        stacked.extend(modifiers.into().0);
        Group {
            manager: self.manager.clone(),
            modifiers: stacked,
        }
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::scheduler::TimerQueue;
    use crate::shortcuts::surface::ElementTree;

    fn manager() -> Manager {
        Manager::new(Rc::new(ElementTree::new()), Rc::new(TimerQueue::new()))
    }

    #[test]
    fn test_key_list_conversions() {
        assert_eq!(KeyList::from("Shift").0, vec!["Shift"]);
        assert_eq!(KeyList::from(["a", "z"]).0, vec!["a", "z"]);
        assert_eq!(KeyList::from(vec!["a".to_string()]).0, vec!["a"]);
        let slice: &[&str] = &["Control", "Alt"];
        assert_eq!(KeyList::from(slice).0, vec!["Control", "Alt"]);
    }

    #[test]
    fn test_register_preserves_declared_order() {
        let manager = manager();
        manager.register(["n", "e", "s"]);
        manager.register(["l", "i", "h"]);

        assert_eq!(
            manager.bindings(),
            vec![vec!["n", "e", "s"], vec!["l", "i", "h"]]
        );
    }

    #[test]
    fn test_group_prefix_cleared_after_callback() {
        let manager = manager();
        manager.group("Shift", |m| {
            assert_eq!(m.group_modifiers(), vec!["Shift"]);
            m.register(["b"]);
        });
        manager.register(["c"]);

        assert!(manager.group_modifiers().is_empty());
        assert_eq!(manager.bindings(), vec![vec!["Shift", "b"], vec!["c"]]);
    }

    #[test]
    fn test_nested_group_replaces_prefix() {
        let manager = manager();
        manager.group("Control", |m| {
            m.group("Alt", |m| {
                m.register(["x"]);
            });
            m.register(["y"]);
        });

        // The inner call replaced and then cleared the prefix
        assert_eq!(manager.bindings(), vec![vec!["Alt", "x"], vec!["y"]]);
    }

    #[test]
    fn test_scoped_groups_stack() {
        let manager = manager();
        let control = manager.scoped("Control");
        let control_alt = control.group("Alt");

        control.register(["s"]);
        control_alt.register(["t"]);

        assert_eq!(control_alt.modifiers(), ["Control", "Alt"]);
        assert_eq!(
            manager.bindings(),
            vec![vec!["Control", "s"], vec!["Control", "Alt", "t"]]
        );
    }

    #[test]
    fn test_stopping_binding_removes_it_from_registry() {
        let manager = manager();
        let first = manager.register(["p"]).then(|_| {});
        manager.register(["o"]).then(|_| {});

        first.stop();
        first.stop();

        assert_eq!(manager.bindings(), vec![vec!["o"]]);
        assert_eq!(manager.events().listener_count(KeyEventKind::Down), 1);
    }

    #[test]
    fn test_stop_all_unsubscribes_everything() {
        let manager = manager();
        manager.register(["a"]).then(|_| {});
        manager.register(["b"]).then(|_| {});

        manager.stop_all();

        assert!(manager.bindings().is_empty());
        assert_eq!(manager.events().listener_count(KeyEventKind::Down), 0);
        assert_eq!(manager.events().listener_count(KeyEventKind::Up), 0);
    }
}
