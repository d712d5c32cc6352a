//! Benchmarks for key dispatch through the binding state machine
//!
//! Measures the cost of one key press against managers of growing size:
//! - every binding listens, only one matches
//! - scoped bindings resolving the focused element
//! - plugin hook dispatch on every match
//!
//! Run with: cargo bench matching

use std::rc::Rc;

use chordwatch::shortcuts::{Binding, ElementTree, KeyEvent, Manager, Plugin, TimerQueue};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

fn manager_with_bindings(count: usize) -> (Manager, Rc<ElementTree>) {
    let tree = Rc::new(ElementTree::new());
    let manager = Manager::new(tree.clone(), Rc::new(TimerQueue::new()));
    for i in 0..count {
        manager
            .register(["Control".to_string(), format!("F{}", i)])
            .then(|_| {});
    }
    (manager, tree)
}

fn press(manager: &Manager, keys: &[KeyEvent]) {
    for key in keys {
        manager.key_down(key);
    }
    for key in keys {
        manager.key_up(key);
    }
}

// ============================================================================
// Dispatch
// ============================================================================

#[divan::bench(args = [1, 10, 100, 1000])]
fn press_matching_combo(bencher: divan::Bencher, count: usize) {
    let (manager, _tree) = manager_with_bindings(count);
    let keys = [KeyEvent::new("Control"), KeyEvent::new("F0")];

    bencher.bench_local(|| press(&manager, divan::black_box(&keys)));
}

#[divan::bench(args = [1, 10, 100, 1000])]
fn press_unbound_key(bencher: divan::Bencher, count: usize) {
    let (manager, _tree) = manager_with_bindings(count);
    let keys = [KeyEvent::new("q")];

    bencher.bench_local(|| press(&manager, divan::black_box(&keys)));
}

#[divan::bench(args = [10, 100])]
fn press_scoped_combo(bencher: divan::Bencher, count: usize) {
    let (manager, tree) = manager_with_bindings(0);
    let mut parent = tree.root();
    for _ in 0..count {
        parent = tree.append(parent, "div");
    }
    tree.set_id(parent, "deep");
    let leaf = tree.append(parent, "span");
    tree.focus(leaf);
    manager.register(["Control", "Enter"]).within("#deep").then(|_| {});

    let keys = [KeyEvent::new("Control"), KeyEvent::new("Enter")];
    bencher.bench_local(|| press(&manager, divan::black_box(&keys)));
}

// ============================================================================
// Plugins
// ============================================================================

struct Approve;

impl Plugin for Approve {
    fn before_binding_handled(&self, _binding: &Binding, _manager: &Manager) -> Option<bool> {
        Some(true)
    }
}

#[divan::bench(args = [0, 1, 8])]
fn press_with_plugins(bencher: divan::Bencher, plugins: usize) {
    let (manager, _tree) = manager_with_bindings(10);
    for _ in 0..plugins {
        manager.use_plugin(Approve);
    }
    let keys = [KeyEvent::new("Control"), KeyEvent::new("F0")];

    bencher.bench_local(|| press(&manager, divan::black_box(&keys)));
}

// ============================================================================
// Registration
// ============================================================================

#[divan::bench(args = [10, 100])]
fn register_and_stop_all(count: usize) {
    let (manager, _tree) = manager_with_bindings(count);
    manager.stop_all();
}
