//! Delayed execution for double-press timeouts

use std::cell::{Cell, RefCell};
use std::time::Duration;

/// A task to run once its delay has elapsed
pub type Task = Box<dyn FnOnce()>;

/// Runs callbacks after a fixed delay, on the same thread as key handling
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Task);
}

struct Timer {
    deadline: Duration,
    seq: u64,
    task: Task,
}

/// Virtual-clock scheduler
///
/// Time only moves when the host calls [`TimerQueue::advance`], which makes
/// it suitable both for tests and for event loops that already track elapsed
/// time between frames.
#[derive(Default)]
pub struct TimerQueue {
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of tasks still waiting
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Move the clock forward and run every task that became due, earliest
    /// deadline first. Tasks scheduled by a running task also run if they
    /// fall within the new time.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;

        while let Some(timer) = self.pop_due(target) {
            self.now.set(timer.deadline);
            (timer.task)();
        }

        self.now.set(target);
    }

    fn pop_due(&self, until: Duration) -> Option<Timer> {
        let mut timers = self.timers.borrow_mut();
        let idx = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(idx, _)| idx)?;
        Some(timers.remove(idx))
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&self, delay: Duration, task: Task) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            deadline: self.now.get() + delay,
            seq,
            task,
        });
    }
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_task_runs_only_after_delay() {
        let queue = TimerQueue::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        queue.schedule(Duration::from_millis(500), Box::new(move || f.set(true)));

        queue.advance(Duration::from_millis(499));
        assert!(!fired.get());
        assert_eq!(queue.pending(), 1);

        queue.advance(Duration::from_millis(1));
        assert!(fired.get());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_tasks_run_in_deadline_order() {
        let queue = TimerQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(300, "late"), (100, "early"), (100, "early-second")] {
            let o = Rc::clone(&order);
            queue.schedule(
                Duration::from_millis(delay),
                Box::new(move || o.borrow_mut().push(label)),
            );
        }

        queue.advance(Duration::from_secs(1));
        assert_eq!(*order.borrow(), vec!["early", "early-second", "late"]);
        assert_eq!(queue.now(), Duration::from_secs(1));
    }

    #[test]
    fn test_nested_schedule_within_window_runs() {
        let queue = Rc::new(TimerQueue::new());
        let fired = Rc::new(Cell::new(0));

        let q = Rc::clone(&queue);
        let f = Rc::clone(&fired);
        queue.schedule(
            Duration::from_millis(100),
            Box::new(move || {
                let f = Rc::clone(&f);
                q.schedule(
                    Duration::from_millis(100),
                    Box::new(move || f.set(f.get() + 1)),
                );
            }),
        );

        queue.advance(Duration::from_millis(250));
        assert_eq!(fired.get(), 1);
    }
}
