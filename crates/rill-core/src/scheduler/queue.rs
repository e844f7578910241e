#![forbid(unsafe_code)]

//! Time-ordered task queue shared by every scheduler implementation.
//!
//! Tasks are keyed by `(due, sequence)`, so tasks due at the same instant run
//! in the order they were scheduled. The queue never runs anything itself:
//! callers [`pop_due`](TaskQueue::pop_due) a task, release whatever borrow
//! guards the queue, run it, and hand repeating tasks back through
//! [`rearm`](TaskQueue::rearm). This keeps task bodies free to schedule or
//! cancel other tasks.
//!
//! # Invariants
//!
//! 1. A cancelled task never runs again, including a repeating task that is
//!    cancelled from inside its own body.
//! 2. Repeating periods are at least [`MIN_PERIOD`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use tracing::warn;

use super::TaskHandle;

/// Shortest accepted repeat period.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Work attached to a queued task.
pub enum Job {
    /// Runs once, then is forgotten.
    Once(Box<dyn FnOnce()>),
    /// Runs every `period` until cancelled.
    Every {
        /// Delay between consecutive runs.
        period: Duration,
        /// Task body.
        body: Box<dyn FnMut()>,
    },
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once(_) => f.write_str("Once"),
            Self::Every { period, .. } => f.debug_struct("Every").field("period", period).finish(),
        }
    }
}

/// A task taken off the queue because it is due.
#[derive(Debug)]
pub struct DueTask {
    /// Handle the task was scheduled under.
    pub handle: TaskHandle,
    /// Instant (relative to the scheduler epoch) it was due at.
    pub due: Duration,
    /// The work to run.
    pub job: Job,
}

type Key = (Duration, u64);

/// Ordered collection of pending tasks.
#[derive(Default)]
pub struct TaskQueue {
    next_seq: u64,
    entries: BTreeMap<Key, (TaskHandle, Job)>,
    /// Live handles and their current key. A repeating task that is currently
    /// running keeps its stale key here until it is re-armed.
    live: HashMap<TaskHandle, Key>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.entries.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&mut self, due: Duration) -> Key {
        let seq = self.next_seq;
        self.next_seq += 1;
        (due, seq)
    }

    /// Queue a one-shot task due at `due`.
    pub fn push_once(&mut self, due: Duration, body: Box<dyn FnOnce()>) -> TaskHandle {
        let key = self.next_key(due);
        let handle = TaskHandle(key.1);
        self.entries.insert(key, (handle, Job::Once(body)));
        self.live.insert(handle, key);
        handle
    }

    /// Queue a repeating task whose first run is due at `now + period`.
    pub fn push_every(
        &mut self,
        now: Duration,
        period: Duration,
        body: Box<dyn FnMut()>,
    ) -> TaskHandle {
        let period = clamp_period(period);
        let key = self.next_key(now.saturating_add(period));
        let handle = TaskHandle(key.1);
        self.entries.insert(key, (handle, Job::Every { period, body }));
        self.live.insert(handle, key);
        handle
    }

    /// Cancel a task. Returns `true` if it was still live.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.live.remove(&handle) {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Whether `handle` is scheduled (or running and not yet cancelled).
    #[must_use]
    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<DueTask> {
        let key = *self.entries.keys().next()?;
        if key.0 > now {
            return None;
        }
        let (handle, job) = self.entries.remove(&key)?;
        if matches!(job, Job::Once(_)) {
            self.live.remove(&handle);
        }
        Some(DueTask {
            handle,
            due: key.0,
            job,
        })
    }

    /// Put a repeating task back after it ran, unless it was cancelled.
    ///
    /// A task whose next run would fall past `Duration::MAX` is retired.
    pub fn rearm(
        &mut self,
        handle: TaskHandle,
        due: Duration,
        period: Duration,
        body: Box<dyn FnMut()>,
    ) {
        if !self.live.contains_key(&handle) {
            return;
        }
        let Some(next) = due.checked_add(period) else {
            self.live.remove(&handle);
            return;
        };
        let key = self.next_key(next);
        self.entries.insert(key, (handle, Job::Every { period, body }));
        self.live.insert(handle, key);
    }
}

fn clamp_period(period: Duration) -> Duration {
    if period < MIN_PERIOD {
        warn!(?period, min = ?MIN_PERIOD, "repeat period clamped");
        MIN_PERIOD
    } else {
        period
    }
}
