#![forbid(unsafe_code)]

//! Source factories: producers built from data, time, or external events.
//!
//! | Factory | Behavior | Timing |
//! |---|---|---|
//! | [`empty`] | completes, no values | synchronous |
//! | [`never`] | nothing, ever | n/a |
//! | [`fail`] | errors | synchronous |
//! | [`of`] | one value, then completes | next scheduler turn |
//! | [`from_iter`] | each value in order, then completes | one turn for the whole run |
//! | [`range`] | inclusive integer range | one turn |
//! | [`timer`] | `0` after a delay, then completes | deferred |
//! | [`interval`] | `0, 1, 2, …` every period | repeating |
//! | [`from_event`] | each named event occurrence | external |
//!
//! Disposing a run stops its timer or listener. Scheduled callbacks check the
//! run's state before acting, so a callback that fires after disposal does
//! nothing.

mod event;
mod time;

use std::rc::Rc;
use std::time::Duration;

use crate::error::StreamError;
use crate::producer::Producer;
use crate::scheduler::SchedulerRef;
use crate::subscription::Subscription;

pub use event::from_event;
pub use time::{interval, timer};

/// Completes immediately without values, inside `subscribe`.
#[must_use]
pub fn empty<T: 'static>() -> Producer<T> {
    Producer::new(|sink| {
        sink.complete();
        Subscription::disposed()
    })
}

/// Never emits and never terminates.
#[must_use]
pub fn never<T: 'static>() -> Producer<T> {
    Producer::new(|_sink| Subscription::new())
}

/// Errors immediately with `err`, inside `subscribe`.
#[must_use]
pub fn fail<T: 'static>(err: StreamError) -> Producer<T> {
    Producer::new(move |sink| {
        sink.error(err.clone());
        Subscription::disposed()
    })
}

/// Emits `value` on the next scheduler turn, then completes.
#[must_use]
pub fn of<T: Clone + 'static>(value: T, scheduler: SchedulerRef) -> Producer<T> {
    from_iter([value], scheduler)
}

/// Emits every value in order on the next scheduler turn, then completes.
///
/// The whole run happens in a single turn; the run's state is checked before
/// each push, so a consumer that disposes mid-run stops it.
#[must_use]
pub fn from_iter<T, I>(values: I, scheduler: SchedulerRef) -> Producer<T>
where
    T: Clone + 'static,
    I: IntoIterator<Item = T>,
{
    let values: Rc<[T]> = values.into_iter().collect();
    Producer::new(move |sink| {
        let values = Rc::clone(&values);
        let run = sink.clone();
        let handle = scheduler.schedule_once(
            Duration::ZERO,
            Box::new(move || {
                for v in values.iter() {
                    if run.is_closed() {
                        return;
                    }
                    run.next(v.clone());
                }
                run.complete();
            }),
        );
        let scheduler = Rc::clone(&scheduler);
        Subscription::from_fn(move || scheduler.cancel(handle))
    })
}

/// Emits `min..=max` on the next scheduler turn, then completes.
///
/// Empty (completes without values) when `min > max`.
#[must_use]
pub fn range(min: i64, max: i64, scheduler: SchedulerRef) -> Producer<i64> {
    if min > max {
        return from_iter(std::iter::empty(), scheduler);
    }
    from_iter(min..=max, scheduler)
}
