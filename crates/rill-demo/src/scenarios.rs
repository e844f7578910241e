#![forbid(unsafe_code)]

//! Reference scenarios, each rendered as output lines.
//!
//! A scenario is a `Producer<String>` built on a scheduler; [`collect`]
//! subscribes to it, lets the caller drive the scheduler, and gathers the
//! lines.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use rill_core::{Consumer, Producer, SchedulerRef, StreamError, source};

/// Every scenario name, in run order.
pub const SCENARIOS: &[&str] = &["reduce", "tic", "merge", "join", "merge-map", "take"];

/// Build the named scenario, or `None` if no such scenario exists.
#[must_use]
pub fn build(name: &str, sched: &SchedulerRef) -> Option<Producer<String>> {
    let producer = match name {
        "reduce" => source::range(0, 5, Rc::clone(sched))
            .reduce()
            .map(|total| format!("sum of 0..=5 is {total}")),
        "tic" => source::from_iter([10, 3, 6, 2, 8], Rc::clone(sched))
            .tic()
            .map(|n| format!("tic {n}")),
        "merge" => merge_scenario(sched),
        "join" => source::from_iter(0..4, Rc::clone(sched))
            .join()
            .merge([source::empty::<i64>().join()])
            .map(|all| format!("joined {all:?}")),
        "merge-map" => {
            let timers = Rc::clone(sched);
            source::range(1, 3, Rc::clone(sched))
                .merge_map(move |n| {
                    let delay = Duration::from_millis(10 * n.unsigned_abs());
                    source::timer(delay, Rc::clone(&timers)).map(move |_| n)
                })
                .join()
                .map(|order| format!("timers fired in order {order:?}"))
        }
        "take" => source::interval(Duration::from_millis(5), Rc::clone(sched))
            .take(4)
            .join()
            .map(|ticks| format!("first ticks {ticks:?}")),
        _ => return None,
    };
    Some(producer)
}

/// Three lists merged; reports the values and how many sources had
/// completed when the merge completed.
fn merge_scenario(sched: &SchedulerRef) -> Producer<String> {
    let completed = Rc::new(Cell::new(0u32));
    let lists: [&[i64]; 3] = [&[3, 4, 4], &[2, 3, 2], &[0]];
    let mut sources = lists.iter().map(|list| {
        let c = Rc::clone(&completed);
        source::from_iter(list.iter().copied(), Rc::clone(sched))
            .tap(Consumer::new().on_complete(move || c.set(c.get() + 1)))
    });
    let Some(first) = sources.next() else {
        return source::empty();
    };
    first
        .merge(sources)
        .join()
        .map(move |values| format!("merged {values:?} after {} completions", completed.get()))
}

/// Subscribe to `scenario`, call `drive` to run the scheduler, and return the
/// collected lines.
///
/// Returns the stream's error if it errored, or an error if it had not
/// completed by the time `drive` returned.
pub fn collect(
    scenario: &Producer<String>,
    drive: impl FnOnce(),
) -> Result<Vec<String>, StreamError> {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let outcome: Rc<RefCell<Option<Result<(), StreamError>>>> = Rc::new(RefCell::new(None));
    let (l, e, c) = (Rc::clone(&lines), Rc::clone(&outcome), Rc::clone(&outcome));
    let sub = scenario.subscribe(
        Consumer::new()
            .on_next(move |line| l.borrow_mut().push(line))
            .on_error(move |err| *e.borrow_mut() = Some(Err(err)))
            .on_complete(move || *c.borrow_mut() = Some(Ok(()))),
    );
    drive();
    sub.dispose();
    let outcome = outcome.borrow_mut().take();
    match outcome {
        Some(Ok(())) => Ok(std::mem::take(&mut *lines.borrow_mut())),
        Some(Err(err)) => Err(err),
        None => Err(StreamError::msg("scenario did not complete")),
    }
}
