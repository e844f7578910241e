#![forbid(unsafe_code)]

//! Timer-driven sources.

use std::rc::Rc;
use std::time::Duration;

use crate::producer::Producer;
use crate::scheduler::SchedulerRef;
use crate::subscription::Subscription;

/// Emits `0, 1, 2, …` every `period`. Never completes on its own.
///
/// The first value arrives one period after subscribing. Periods shorter than
/// [`MIN_PERIOD`](crate::scheduler::MIN_PERIOD) are clamped.
#[must_use]
pub fn interval(period: Duration, scheduler: SchedulerRef) -> Producer<u64> {
    Producer::new(move |sink| {
        let run = sink.clone();
        let mut count = 0u64;
        let handle = scheduler.schedule_repeating(
            period,
            Box::new(move || {
                if run.is_closed() {
                    return;
                }
                let n = count;
                count += 1;
                run.next(n);
            }),
        );
        let scheduler = Rc::clone(&scheduler);
        Subscription::from_fn(move || scheduler.cancel(handle))
    })
}

/// Emits `0` once after `delay`, then completes.
#[must_use]
pub fn timer(delay: Duration, scheduler: SchedulerRef) -> Producer<u64> {
    Producer::new(move |sink| {
        let run = sink.clone();
        let handle = scheduler.schedule_once(
            delay,
            Box::new(move || {
                run.next(0);
                run.complete();
            }),
        );
        let scheduler = Rc::clone(&scheduler);
        Subscription::from_fn(move || scheduler.cancel(handle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::Consumer;
    use crate::scheduler::{LabScheduler, Scheduler};
    use std::cell::{Cell, RefCell};

    #[test]
    fn interval_ticks_every_period() {
        let lab = LabScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = interval(Duration::from_millis(10), lab.handle())
            .subscribe_next(move |n| s.borrow_mut().push(n));

        lab.advance(Duration::from_millis(9));
        assert!(seen.borrow().is_empty());
        lab.advance(Duration::from_millis(31));
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
        sub.dispose();
    }

    #[test]
    fn interval_dispose_stops_timer() {
        let lab = LabScheduler::new();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let sub = interval(Duration::from_millis(5), lab.handle())
            .subscribe_next(move |_| s.set(s.get() + 1));
        lab.advance(Duration::from_millis(10));
        sub.dispose();
        sub.dispose();
        assert!(lab.is_idle());
        lab.advance(Duration::from_millis(100));
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn interval_disposed_from_inside_reaction() {
        let lab = LabScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let s = Rc::clone(&seen);
        let h = Rc::clone(&slot);
        let sub = interval(Duration::from_millis(1), lab.handle()).subscribe_next(move |n| {
            s.borrow_mut().push(n);
            if n == 1
                && let Some(sub) = h.borrow().as_ref()
            {
                sub.dispose();
            }
        });
        *slot.borrow_mut() = Some(sub);
        lab.advance(Duration::from_millis(10));
        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert!(lab.is_idle());
    }

    #[test]
    fn independent_intervals_count_from_zero() {
        let lab = LabScheduler::new();
        let p = interval(Duration::from_millis(2), lab.handle());
        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let ac = Rc::clone(&a);
        let _x = p.subscribe_next(move |n| ac.borrow_mut().push(n));
        lab.advance(Duration::from_millis(4));
        let bc = Rc::clone(&b);
        let _y = p.subscribe_next(move |n| bc.borrow_mut().push(n));
        lab.advance(Duration::from_millis(4));
        assert_eq!(*a.borrow(), vec![0, 1, 2, 3]);
        assert_eq!(*b.borrow(), vec![0, 1]);
    }

    #[test]
    fn timer_fires_once_and_completes() {
        let lab = LabScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(Cell::new(false));
        let (s, d) = (Rc::clone(&seen), Rc::clone(&done));
        let _sub = timer(Duration::from_millis(30), lab.handle()).subscribe(
            Consumer::new()
                .on_next(move |n| s.borrow_mut().push(n))
                .on_complete(move || d.set(true)),
        );
        lab.advance(Duration::from_millis(29));
        assert!(!done.get());
        lab.advance(Duration::from_millis(1));
        assert_eq!(*seen.borrow(), vec![0]);
        assert!(done.get());
        assert_eq!(lab.now(), Duration::from_millis(30));
    }

    #[test]
    fn max_timer_and_interval_stay_pending() {
        let lab = LabScheduler::new();
        lab.advance(Duration::from_millis(1));
        let hits = Rc::new(Cell::new(0));
        let (a, b) = (Rc::clone(&hits), Rc::clone(&hits));
        let once = timer(Duration::MAX, lab.handle()).subscribe_next(move |_| a.set(a.get() + 1));
        let every =
            interval(Duration::MAX, lab.handle()).subscribe_next(move |_| b.set(b.get() + 1));
        assert_eq!(lab.pending(), 2);
        lab.advance(Duration::from_secs(3600));
        assert_eq!(hits.get(), 0);
        once.dispose();
        every.dispose();
        assert!(lab.is_idle());
    }
}
