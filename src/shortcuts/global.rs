//! Thread-local default manager for hosts that want a single global entry point
//!
//! Library code should take a [`Manager`] explicitly; this module is only for
//! the outermost layer of an application.

use std::cell::RefCell;
use std::rc::Rc;

use super::binding::Binding;
use super::manager::Manager;
use super::scheduler::TimerQueue;
use super::surface::ElementTree;

thread_local! {
    static DEFAULT: RefCell<Option<Manager>> = const { RefCell::new(None) };
}

/// What [`when_i_press`] hands back
#[derive(Debug, Clone)]
pub enum Registration {
    /// No keys were given
    Manager(Manager),
    Binding(Binding),
}

impl Registration {
    pub fn into_binding(self) -> Option<Binding> {
        match self {
            Registration::Binding(binding) => Some(binding),
            Registration::Manager(_) => None,
        }
    }

    pub fn into_manager(self) -> Option<Manager> {
        match self {
            Registration::Manager(manager) => Some(manager),
            Registration::Binding(_) => None,
        }
    }
}

/// The default manager, created on first use with a headless surface
pub fn manager() -> Manager {
    DEFAULT.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                tracing::debug!("creating default manager");
                Manager::new(Rc::new(ElementTree::new()), Rc::new(TimerQueue::new()))
            })
            .clone()
    })
}

/// Replace the default manager, returning the previous one
pub fn install(manager: Manager) -> Option<Manager> {
    DEFAULT.with(|slot| slot.borrow_mut().replace(manager))
}

/// Register `keys` on the default manager, or return the manager when empty
pub fn when_i_press<I, S>(keys: I) -> Registration
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    if keys.is_empty() {
        return Registration::Manager(manager());
    }
    Registration::Binding(manager().register(keys))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registration_returns_manager() {
        let registration = when_i_press(Vec::<String>::new());
        assert!(registration.into_manager().is_some());
    }

    #[test]
    fn test_registration_uses_default_manager() {
        let fresh = Manager::new(Rc::new(ElementTree::new()), Rc::new(TimerQueue::new()));
        install(fresh);

        let binding = when_i_press(["g", "h"]).into_binding().unwrap();
        assert_eq!(binding.watched_keys(), vec!["g", "h"]);
        assert_eq!(manager().bindings(), vec![vec!["g", "h"]]);

        manager().stop_all();
        assert!(manager().bindings().is_empty());
    }
}
