#![forbid(unsafe_code)]

//! Interleaving several producers into one.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::consumer::Consumer;
use crate::producer::Producer;
use crate::subscription::Subscription;

impl<T: 'static> Producer<T> {
    /// Interleave this producer with `others`, in arrival order.
    ///
    /// Sources are subscribed in order. Completes once every source has
    /// completed; the first error is forwarded and every source is disposed.
    #[must_use]
    pub fn merge(&self, others: impl IntoIterator<Item = Producer<T>>) -> Producer<T> {
        let sources: Rc<[Producer<T>]> = std::iter::once(self.clone()).chain(others).collect();
        Producer::new(move |sink| {
            let total = sources.len();
            let completed = Rc::new(Cell::new(0usize));
            let all = Subscription::new();
            for (index, source) in sources.iter().enumerate() {
                if sink.is_closed() {
                    break;
                }
                trace!(index, total, "merge subscribing source");
                let (n, e, c) = (sink.clone(), sink.clone(), sink.clone());
                let completed = Rc::clone(&completed);
                all.add(
                    source.subscribe(
                        Consumer::new()
                            .on_next(move |v| n.next(v))
                            .on_error(move |err| e.error(err))
                            .on_complete(move || {
                                completed.set(completed.get() + 1);
                                if completed.get() == total {
                                    c.complete();
                                }
                            }),
                    ),
                );
            }
            all
        })
    }

    /// Interleave with one other producer.
    #[must_use]
    pub fn merge_with(&self, other: &Producer<T>) -> Producer<T> {
        self.merge([other.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::ops::testing::{Log, record};
    use crate::scheduler::LabScheduler;
    use crate::source;
    use crate::subject::Subject;
    use std::time::Duration;

    #[test]
    fn merges_in_arrival_order() {
        let a = Subject::new();
        let b = Subject::new();
        let log = Log::new();
        let _sub = a.as_producer().merge_with(&b.as_producer()).subscribe(record(&log));
        a.next(1);
        b.next(2);
        a.next(3);
        assert_eq!(log.values(), vec![1, 2, 3]);
    }

    #[test]
    fn completes_after_all_sources() {
        let a = Subject::new();
        let b = Subject::new();
        let log: Rc<Log<i32>> = Log::new();
        let _sub = a.as_producer().merge_with(&b.as_producer()).subscribe(record(&log));
        a.complete();
        assert_eq!(log.completions.get(), 0);
        b.complete();
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn synchronous_sources_complete_once() {
        let log: Rc<Log<i32>> = Log::new();
        let _sub = source::empty::<i32>()
            .merge([source::empty(), source::empty()])
            .subscribe(record(&log));
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn first_error_disposes_everything() {
        let lab = LabScheduler::new();
        let hub = Subject::new();
        let log = Log::new();
        let _sub = source::interval(Duration::from_millis(5), lab.handle())
            .merge_with(&hub.as_producer())
            .subscribe(record(&log));
        lab.advance(Duration::from_millis(5));
        hub.error(StreamError::msg("down"));
        lab.advance(Duration::from_millis(50));
        assert_eq!(log.values(), vec![0]);
        assert_eq!(log.errors.borrow().len(), 1);
        assert!(lab.is_idle());
    }

    #[test]
    fn synchronous_error_skips_remaining_sources() {
        let started = Rc::new(Cell::new(false));
        let s = Rc::clone(&started);
        let late: Producer<i32> = Producer::new(move |_sink| {
            s.set(true);
            Subscription::new()
        });
        let log = Log::new();
        let _sub = source::fail::<i32>(StreamError::msg("early"))
            .merge([late])
            .subscribe(record(&log));
        assert!(!started.get());
        assert_eq!(log.errors.borrow().len(), 1);
    }

    #[test]
    fn dispose_reaches_every_source() {
        let lab = LabScheduler::new();
        let sub = source::interval(Duration::from_millis(1), lab.handle())
            .merge([
                source::interval(Duration::from_millis(2), lab.handle()),
                source::interval(Duration::from_millis(3), lab.handle()),
            ])
            .subscribe(Consumer::new());
        assert_eq!(lab.pending(), 3);
        sub.dispose();
        assert_eq!(lab.pending(), 0);
    }
}
