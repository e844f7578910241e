#![forbid(unsafe_code)]

//! Deferred and periodic task scheduling.
//!
//! Deferred source factories never reach for a global timer: they receive a
//! [`SchedulerRef`] capability. Two implementations exist:
//!
//! - [`LabScheduler`]: virtual time advanced by the caller, for deterministic
//!   tests.
//! - `LocalScheduler` in `rill-runtime`: a wall-clock run loop.
//!
//! Both are built on [`TaskQueue`] and [`run_next_due`].

pub mod lab;
pub mod queue;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

pub use lab::LabScheduler;
pub use queue::{DueTask, Job, MIN_PERIOD, TaskQueue};

/// Identifies a scheduled task for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

impl TaskHandle {
    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host task-scheduling capability.
pub trait Scheduler {
    /// Time elapsed since the scheduler was created.
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now. A zero delay means "next turn".
    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle;

    /// Run `task` every `period` until cancelled. The first run is one
    /// period from now.
    fn schedule_repeating(&self, period: Duration, task: Box<dyn FnMut()>) -> TaskHandle;

    /// Cancel a pending or repeating task. Cancelling twice is harmless.
    fn cancel(&self, handle: TaskHandle);
}

/// Shared scheduler capability passed into source factories.
pub type SchedulerRef = Rc<dyn Scheduler>;

/// Pop and run the earliest task due at or before `now`.
///
/// The queue borrow is released while the task body runs. Returns `false`
/// when nothing was due.
pub fn run_next_due(queue: &RefCell<TaskQueue>, now: Duration) -> bool {
    let Some(task) = queue.borrow_mut().pop_due(now) else {
        return false;
    };
    let due_us = u64::try_from(task.due.as_micros()).unwrap_or(u64::MAX);
    debug!(task = task.handle.raw(), due_us, "running task");
    match task.job {
        Job::Once(body) => body(),
        Job::Every { period, mut body } => {
            body();
            queue.borrow_mut().rearm(task.handle, task.due, period, body);
        }
    }
    true
}
