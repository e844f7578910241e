#![forbid(unsafe_code)]

//! Deterministic virtual-time scheduler.
//!
//! [`LabScheduler`] never sleeps. Time only moves when the caller says so,
//! which makes timer-driven streams fully reproducible in tests:
//!
//! ```
//! use std::time::Duration;
//! use rill_core::scheduler::LabScheduler;
//! use rill_core::source;
//!
//! let lab = LabScheduler::new();
//! let ticks = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
//! let t = std::rc::Rc::clone(&ticks);
//! let sub = source::interval(Duration::from_millis(100), lab.handle())
//!     .subscribe_next(move |n| t.borrow_mut().push(n));
//!
//! lab.advance(Duration::from_millis(350));
//! assert_eq!(*ticks.borrow(), vec![0, 1, 2]);
//! sub.dispose();
//! ```
//!
//! # Invariants
//!
//! 1. Tasks run in `(due, schedule order)` order.
//! 2. While a task runs, [`Scheduler::now`] reports that task's due time.
//! 3. After [`advance`](LabScheduler::advance) returns, every task due at or
//!    before the new time has run, including tasks scheduled by other tasks.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::queue::TaskQueue;
use super::{Scheduler, SchedulerRef, TaskHandle, run_next_due};

struct LabInner {
    now: Cell<Duration>,
    queue: RefCell<TaskQueue>,
}

/// A manually-advanced scheduler for deterministic tests.
///
/// Cloning creates a new handle to the **same** clock and queue.
#[derive(Clone)]
pub struct LabScheduler {
    inner: Rc<LabInner>,
}

impl fmt::Debug for LabScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabScheduler")
            .field("now", &self.inner.now.get())
            .field("queue", &*self.inner.queue.borrow())
            .finish()
    }
}

impl Default for LabScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl LabScheduler {
    /// Create a scheduler at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(LabInner {
                now: Cell::new(Duration::ZERO),
                queue: RefCell::new(TaskQueue::new()),
            }),
        }
    }

    /// This scheduler as a shareable capability.
    #[must_use]
    pub fn handle(&self) -> SchedulerRef {
        Rc::new(self.clone())
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Whether no task is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.queue.borrow().is_empty()
    }

    /// Run every task due at the current time (zero-delay turns included).
    ///
    /// Returns the number of tasks run.
    pub fn flush(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Move time forward by `delta`, running every task that falls due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.inner.now.get().saturating_add(delta);
        let mut ran = 0;
        loop {
            let due = self.inner.queue.borrow().next_due();
            match due {
                Some(due) if due <= target => {
                    if due > self.inner.now.get() {
                        self.inner.now.set(due);
                    }
                    if run_next_due(&self.inner.queue, self.inner.now.get()) {
                        ran += 1;
                    }
                }
                _ => break,
            }
        }
        self.inner.now.set(target);
        ran
    }

    /// Jump from task to task until the queue is empty or `limit` tasks ran.
    ///
    /// Repeating tasks never leave the queue on their own, so `limit` bounds
    /// the work. Returns the number of tasks run.
    pub fn run_until_idle(&self, limit: usize) -> usize {
        let mut ran = 0;
        while ran < limit {
            let Some(due) = self.inner.queue.borrow().next_due() else {
                break;
            };
            if due > self.inner.now.get() {
                self.inner.now.set(due);
            }
            if run_next_due(&self.inner.queue, self.inner.now.get()) {
                ran += 1;
            }
        }
        ran
    }
}

impl Scheduler for LabScheduler {
    fn now(&self) -> Duration {
        self.inner.now.get()
    }

    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let due = self.inner.now.get().saturating_add(delay);
        self.inner.queue.borrow_mut().push_once(due, task)
    }

    fn schedule_repeating(&self, period: Duration, task: Box<dyn FnMut()>) -> TaskHandle {
        let now = self.inner.now.get();
        self.inner.queue.borrow_mut().push_every(now, period, task)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.inner.queue.borrow_mut().cancel(handle);
    }
}
