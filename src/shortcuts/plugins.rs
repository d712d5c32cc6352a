//! Plugin hooks and the dispatcher that runs them
//!
//! A plugin implements whichever [`Plugin`] hooks it cares about; the rest
//! keep their default bodies and count as absent. The dispatcher calls one
//! [`Hook`] on every registered plugin in registration order and collects
//! the answers.

use std::cell::RefCell;
use std::rc::Rc;

use super::binding::Binding;
use super::manager::Manager;

/// Extension points a plugin may observe
///
/// Only [`Plugin::before_binding_handled`] has a meaningful return value:
/// `Some(false)` vetoes the match, `Some(true)` and `None` let it through.
pub trait Plugin {
    /// Called once, right after the plugin is added to a manager
    fn mounted(&self, _manager: &Manager) {}

    fn binding_registered(&self, _binding: &Binding, _manager: &Manager) {}

    fn binding_stopped(&self, _binding: &Binding, _manager: &Manager) {}

    fn all_bindings_stopped(&self, _manager: &Manager) {}

    fn before_binding_handled(&self, _binding: &Binding, _manager: &Manager) -> Option<bool> {
        None
    }

    fn after_binding_handled(&self, _binding: &Binding, _manager: &Manager) {}
}

/// One invocation of a plugin hook with its arguments
#[derive(Clone, Copy, Debug)]
pub enum Hook<'a> {
    Mounted,
    BindingRegistered(&'a Binding),
    BindingStopped(&'a Binding),
    AllBindingsStopped,
    BeforeBindingHandled(&'a Binding),
    AfterBindingHandled(&'a Binding),
}

impl Hook<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Hook::Mounted => "mounted",
            Hook::BindingRegistered(_) => "bindingRegistered",
            Hook::BindingStopped(_) => "bindingStopped",
            Hook::AllBindingsStopped => "allBindingsStopped",
            Hook::BeforeBindingHandled(_) => "beforeBindingHandled",
            Hook::AfterBindingHandled(_) => "afterBindingHandled",
        }
    }

    fn invoke(self, plugin: &dyn Plugin, manager: &Manager) -> Option<bool> {
        match self {
            Hook::Mounted => plugin.mounted(manager),
            Hook::BindingRegistered(binding) => plugin.binding_registered(binding, manager),
            Hook::BindingStopped(binding) => plugin.binding_stopped(binding, manager),
            Hook::AllBindingsStopped => plugin.all_bindings_stopped(manager),
            Hook::BeforeBindingHandled(binding) => {
                return plugin.before_binding_handled(binding, manager)
            }
            Hook::AfterBindingHandled(binding) => plugin.after_binding_handled(binding, manager),
        }
        None
    }
}

/// Whether any plugin answered `Some(false)`
pub fn is_vetoed(responses: &[Option<bool>]) -> bool {
    responses.contains(&Some(false))
}

/// Ordered collection of plugins shared by a manager
///
/// The same plugin may be added more than once; it is then invoked once per
/// registration.
#[derive(Default)]
pub struct PluginDispatcher {
    plugins: RefCell<Vec<Rc<dyn Plugin>>>,
}

impl PluginDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append plugins, then run each one's `mounted` hook
    pub fn add<I>(&self, plugins: I, manager: &Manager)
    where
        I: IntoIterator<Item = Rc<dyn Plugin>>,
    {
        let added: Vec<Rc<dyn Plugin>> = plugins.into_iter().collect();
        self.plugins
            .borrow_mut()
            .extend(added.iter().map(Rc::clone));

        tracing::debug!(count = added.len(), "plugins added");

        for plugin in added {
            Hook::Mounted.invoke(plugin.as_ref(), manager);
        }
    }

    /// Run a hook on every plugin, returning one answer per plugin
    ///
    /// Plugins may add plugins or register bindings from inside a hook; the
    /// hook only reaches the plugins registered when it started.
    pub fn handle(&self, hook: Hook<'_>, manager: &Manager) -> Vec<Option<bool>> {
        let snapshot: Vec<Rc<dyn Plugin>> = self.plugins.borrow().clone();
        tracing::trace!(hook = hook.name(), plugins = snapshot.len(), "dispatching hook");

        snapshot
            .iter()
            .map(|plugin| hook.invoke(plugin.as_ref(), manager))
            .collect()
    }

    /// Drop every plugin. Live bindings are unaffected.
    pub fn flush(&self) {
        self.plugins.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.plugins.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.borrow().is_empty()
    }
}

impl std::fmt::Debug for PluginDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDispatcher")
            .field("plugins", &self.len())
            .finish()
    }
}

/// A plugin whose hooks read a caller-supplied options record
pub trait PluginWith<O> {
    fn mounted(&self, _manager: &Manager, _options: &O) {}

    fn binding_registered(&self, _binding: &Binding, _manager: &Manager, _options: &O) {}

    fn binding_stopped(&self, _binding: &Binding, _manager: &Manager, _options: &O) {}

    fn all_bindings_stopped(&self, _manager: &Manager, _options: &O) {}

    fn before_binding_handled(
        &self,
        _binding: &Binding,
        _manager: &Manager,
        _options: &O,
    ) -> Option<bool> {
        None
    }

    fn after_binding_handled(&self, _binding: &Binding, _manager: &Manager, _options: &O) {}
}

/// Pairs a [`PluginWith`] implementation with its options
#[derive(Debug, Clone)]
pub struct WithOptions<P, O> {
    pub plugin: P,
    pub options: O,
}

impl<P, O> WithOptions<P, O> {
    pub fn new(plugin: P, options: O) -> Self {
        Self { plugin, options }
    }
}

impl<P: PluginWith<O>, O> Plugin for WithOptions<P, O> {
    fn mounted(&self, manager: &Manager) {
        self.plugin.mounted(manager, &self.options)
    }

    fn binding_registered(&self, binding: &Binding, manager: &Manager) {
        self.plugin
            .binding_registered(binding, manager, &self.options)
    }

    fn binding_stopped(&self, binding: &Binding, manager: &Manager) {
        self.plugin.binding_stopped(binding, manager, &self.options)
    }

    fn all_bindings_stopped(&self, manager: &Manager) {
        self.plugin.all_bindings_stopped(manager, &self.options)
    }

    fn before_binding_handled(&self, binding: &Binding, manager: &Manager) -> Option<bool> {
        self.plugin
            .before_binding_handled(binding, manager, &self.options)
    }

    fn after_binding_handled(&self, binding: &Binding, manager: &Manager) {
        self.plugin
            .after_binding_handled(binding, manager, &self.options)
    }
}
