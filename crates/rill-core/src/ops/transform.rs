#![forbid(unsafe_code)]

//! Per-value transformation and filtering.

use std::rc::Rc;

use super::relay;
use crate::consumer::Consumer;
use crate::producer::Producer;

impl<T: 'static> Producer<T> {
    /// Transform each value through `f`.
    #[must_use]
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Producer<U> {
        let upstream = self.clone();
        let f = Rc::new(f);
        Producer::new(move |sink| {
            let f = Rc::clone(&f);
            let down = sink.clone();
            upstream.subscribe(relay(&sink).on_next(move |v| down.next(f(v))))
        })
    }

    /// Forward only the values for which `pred` holds.
    #[must_use]
    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Producer<T> {
        let upstream = self.clone();
        let pred = Rc::new(pred);
        Producer::new(move |sink| {
            let pred = Rc::clone(&pred);
            let down = sink.clone();
            upstream.subscribe(relay(&sink).on_next(move |v| {
                if pred(&v) {
                    down.next(v);
                }
            }))
        })
    }

    /// Replace every value with the constant `1`.
    #[must_use]
    pub fn uno(&self) -> Producer<u64> {
        self.map(|_| 1)
    }
}

impl<T: Clone + 'static> Producer<T> {
    /// Run `observer`'s reactions as side effects, then forward each
    /// notification unchanged.
    #[must_use]
    pub fn tap(&self, observer: Consumer<T>) -> Producer<T> {
        let upstream = self.clone();
        Producer::new(move |sink| {
            let (n, e, c) = (sink.clone(), sink.clone(), sink.clone());
            let (on, oe, oc) = (observer.clone(), observer.clone(), observer.clone());
            upstream.subscribe(
                Consumer::new()
                    .on_next(move |v: T| {
                        on.next(v.clone());
                        n.next(v);
                    })
                    .on_error(move |err| {
                        oe.error(err.clone());
                        e.error(err);
                    })
                    .on_complete(move || {
                        oc.complete();
                        c.complete();
                    }),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::ops::testing::{Log, record};
    use crate::scheduler::LabScheduler;
    use crate::source;
    use std::cell::{Cell, RefCell};

    #[test]
    fn map_transforms_values() {
        let lab = LabScheduler::new();
        let log = Log::new();
        let _sub = source::from_iter([1, 2, 3], lab.handle())
            .map(|v| v * 10)
            .subscribe(record(&log));
        lab.flush();
        assert_eq!(log.values(), vec![10, 20, 30]);
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn map_changes_type() {
        let lab = LabScheduler::new();
        let log = Log::new();
        let _sub = source::from_iter([1, 22], lab.handle())
            .map(|v: i32| v.to_string())
            .subscribe(record(&log));
        lab.flush();
        assert_eq!(log.values(), vec!["1".to_string(), "22".to_string()]);
    }

    #[test]
    fn map_passes_error_through() {
        let log: Rc<Log<i32>> = Log::new();
        let _sub = source::fail::<i32>(StreamError::msg("e"))
            .map(|v| v + 1)
            .subscribe(record(&log));
        assert_eq!(*log.errors.borrow(), vec![StreamError::msg("e")]);
        assert_eq!(log.completions.get(), 0);
    }

    #[test]
    fn filter_keeps_matching() {
        let lab = LabScheduler::new();
        let log = Log::new();
        let _sub = source::range(1, 10, lab.handle())
            .filter(|v| v % 3 == 0)
            .subscribe(record(&log));
        lab.flush();
        assert_eq!(log.values(), vec![3, 6, 9]);
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn uno_maps_to_one() {
        let lab = LabScheduler::new();
        let log = Log::new();
        let _sub = source::from_iter(["a", "b"], lab.handle())
            .uno()
            .subscribe(record(&log));
        lab.flush();
        assert_eq!(log.values(), vec![1, 1]);
    }

    #[test]
    fn tap_sees_every_notification_before_downstream() {
        let lab = LabScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let tapped_done = Rc::new(Cell::new(false));

        let o1 = Rc::clone(&order);
        let td = Rc::clone(&tapped_done);
        let o2 = Rc::clone(&order);
        let o3 = Rc::clone(&order);
        let _sub = source::from_iter([1, 2], lab.handle())
            .tap(
                Consumer::new()
                    .on_next(move |v| o1.borrow_mut().push(format!("tap {v}")))
                    .on_complete(move || td.set(true)),
            )
            .subscribe(
                Consumer::new()
                    .on_next(move |v| o2.borrow_mut().push(format!("out {v}")))
                    .on_complete(move || o3.borrow_mut().push("done".into())),
            );
        lab.flush();
        assert_eq!(
            *order.borrow(),
            vec!["tap 1", "out 1", "tap 2", "out 2", "done"]
        );
        assert!(tapped_done.get());
    }

    #[test]
    fn tap_forwards_error() {
        let log: Rc<Log<i32>> = Log::new();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = source::fail::<i32>(StreamError::msg("x"))
            .tap(Consumer::new().on_error(move |_| s.set(s.get() + 1)))
            .subscribe(record(&log));
        assert_eq!(seen.get(), 1);
        assert_eq!(log.errors.borrow().len(), 1);
    }

    #[test]
    fn dispose_propagates_upstream() {
        let lab = LabScheduler::new();
        let sub = source::interval(std::time::Duration::from_millis(1), lab.handle())
            .map(|v| v + 1)
            .filter(|v| v % 2 == 0)
            .subscribe(crate::consumer::Consumer::new());
        assert_eq!(lab.pending(), 1);
        sub.dispose();
        assert_eq!(lab.pending(), 0);
    }
}
