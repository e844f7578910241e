#![forbid(unsafe_code)]

//! Wall-clock run loop.
//!
//! [`LocalScheduler`] owns a [`TaskQueue`] and runs it on the calling
//! thread. Streams are wired up first, then [`run`](LocalScheduler::run)
//! blocks until nothing is pending, a [`StopHandle`] is triggered, or the
//! configured deadline passes.
//!
//! # Invariants
//!
//! 1. Tasks run in `(due, schedule order)` order, never before they are due.
//! 2. A single idle sleep never exceeds `max_idle_sleep`, so a stop request
//!    or deadline is noticed promptly.
//! 3. The queue is not borrowed while a task body runs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use rill_core::scheduler::{Scheduler, SchedulerRef, TaskHandle, TaskQueue, run_next_due};
use tracing::{debug, info};
use web_time::Instant;

use crate::config::RuntimeConfig;

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No task was left.
    Idle,
    /// A [`StopHandle`] was triggered.
    Stopped,
    /// The deadline passed with tasks still pending.
    DeadlineReached,
}

/// Summary of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub tasks_run: u64,
    pub elapsed: Duration,
}

/// Requests that the owning run loop return.
///
/// Checked between tasks; typically triggered from inside a reaction.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Rc<Cell<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.set(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.get()
    }
}

struct LocalInner {
    epoch: Instant,
    queue: RefCell<TaskQueue>,
    stop: Rc<Cell<bool>>,
    max_idle_sleep: Duration,
    run_deadline: Option<Duration>,
}

/// Single-threaded wall-clock scheduler.
///
/// Cloning creates a new handle to the **same** queue.
#[derive(Clone)]
pub struct LocalScheduler {
    inner: Rc<LocalInner>,
}

impl fmt::Debug for LocalScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalScheduler")
            .field("now", &self.now())
            .field("queue", &*self.inner.queue.borrow())
            .field("max_idle_sleep", &self.inner.max_idle_sleep)
            .finish()
    }
}

impl LocalScheduler {
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(LocalInner {
                epoch: Instant::now(),
                queue: RefCell::new(TaskQueue::new()),
                stop: Rc::new(Cell::new(false)),
                max_idle_sleep: config.max_idle_sleep,
                run_deadline: config.run_deadline,
            }),
        }
    }

    /// This scheduler as a shareable capability.
    #[must_use]
    pub fn handle(&self) -> SchedulerRef {
        Rc::new(self.clone())
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Rc::clone(&self.inner.stop),
        }
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Run until idle, stopped, or the configured deadline.
    pub fn run(&self) -> RunReport {
        self.run_loop(self.inner.run_deadline)
    }

    /// Run until idle, stopped, or `limit` has elapsed.
    pub fn run_for(&self, limit: Duration) -> RunReport {
        self.run_loop(Some(limit))
    }

    fn run_loop(&self, limit: Option<Duration>) -> RunReport {
        let started = Instant::now();
        let deadline = limit.map(|d| self.now().saturating_add(d));
        self.inner.stop.set(false);
        let mut tasks_run = 0u64;
        info!(pending = self.pending(), ?limit, "run loop started");

        let outcome = loop {
            if self.inner.stop.get() {
                break RunOutcome::Stopped;
            }
            let now = self.now();
            if deadline.is_some_and(|d| now >= d) {
                break RunOutcome::DeadlineReached;
            }
            if run_next_due(&self.inner.queue, now) {
                tasks_run += 1;
                continue;
            }
            let Some(due) = self.inner.queue.borrow().next_due() else {
                break RunOutcome::Idle;
            };
            let mut wait = due.saturating_sub(now).min(self.inner.max_idle_sleep);
            if let Some(d) = deadline {
                wait = wait.min(d.saturating_sub(now));
            }
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        };

        let report = RunReport {
            outcome,
            tasks_run,
            elapsed: started.elapsed(),
        };
        debug!(?report, pending = self.pending(), "run loop finished");
        report
    }
}

impl Scheduler for LocalScheduler {
    fn now(&self) -> Duration {
        self.inner.epoch.elapsed()
    }

    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let due = self.now().saturating_add(delay);
        self.inner.queue.borrow_mut().push_once(due, task)
    }

    fn schedule_repeating(&self, period: Duration, task: Box<dyn FnMut()>) -> TaskHandle {
        let now = self.now();
        self.inner.queue.borrow_mut().push_every(now, period, task)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.inner.queue.borrow_mut().cancel(handle);
    }
}
