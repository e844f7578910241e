#![forbid(unsafe_code)]

//! Flattening a producer of producers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::consumer::Consumer;
use crate::producer::Producer;
use crate::sink::Sink;
use crate::subscription::Subscription;

/// Completion bookkeeping and live inner subscriptions for one `merge_all`
/// run.
#[derive(Default)]
struct Flatten {
    subscribed: Cell<usize>,
    completed: Cell<usize>,
    outer_done: Cell<bool>,
    next_key: Cell<u64>,
    live: RefCell<Vec<(u64, Subscription)>>,
}

impl Flatten {
    fn finish_if_drained<T: 'static>(&self, sink: &Sink<T>) {
        if self.outer_done.get() && self.completed.get() == self.subscribed.get() {
            sink.complete();
        }
    }

    fn reserve_key(&self) -> u64 {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        key
    }

    /// Keep `sub` until its inner completes. Inners that already finished are
    /// not kept; inners arriving after shutdown are disposed at once.
    fn track(&self, key: u64, sub: Subscription, closed: bool) {
        if sub.is_disposed() {
            return;
        }
        if closed {
            sub.dispose();
            return;
        }
        self.live.borrow_mut().push((key, sub));
    }

    fn release(&self, key: u64) {
        let removed = {
            let mut live = self.live.borrow_mut();
            let idx = live.iter().position(|(k, _)| *k == key);
            idx.map(|idx| live.swap_remove(idx))
        };
        drop(removed);
    }

    fn dispose_live(&self) {
        let live = std::mem::take(&mut *self.live.borrow_mut());
        for (_, sub) in live {
            sub.dispose();
        }
    }

    #[cfg(test)]
    fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}

fn run_merge<T: 'static>(
    outer: &Producer<Producer<T>>,
    sink: &Sink<T>,
    book: Rc<Flatten>,
) -> Subscription {
    let all = Subscription::new();
    let shutdown_book = Rc::clone(&book);
    all.add_fn(move || shutdown_book.dispose_live());

    let (down, inner_book) = (sink.clone(), Rc::clone(&book));
    let (e, c, outer_book) = (sink.clone(), sink.clone(), book);
    let outer_sub = outer.subscribe(
        Consumer::new()
            .on_next(move |inner: Producer<T>| {
                if down.is_closed() {
                    return;
                }
                // Counted before subscribing so a synchronous inner
                // completion sees itself.
                inner_book.subscribed.set(inner_book.subscribed.get() + 1);
                let key = inner_book.reserve_key();
                trace!(inners = inner_book.subscribed.get(), "merge_all inner");
                let (n, ie, ic) = (down.clone(), down.clone(), down.clone());
                let done_book = Rc::clone(&inner_book);
                let sub = inner.subscribe(
                    Consumer::new()
                        .on_next(move |v| n.next(v))
                        .on_error(move |err| ie.error(err))
                        .on_complete(move || {
                            done_book.completed.set(done_book.completed.get() + 1);
                            done_book.release(key);
                            done_book.finish_if_drained(&ic);
                        }),
                );
                inner_book.track(key, sub, down.is_closed());
            })
            .on_error(move |err| e.error(err))
            .on_complete(move || {
                outer_book.outer_done.set(true);
                outer_book.finish_if_drained(&c);
            }),
    );
    all.add(outer_sub);
    all
}

impl<T: 'static> Producer<Producer<T>> {
    /// Subscribe to every inner producer as it arrives and interleave their
    /// values.
    ///
    /// Completes when the outer producer and every inner producer subscribed
    /// so far have completed. Any error is forwarded and disposes all.
    /// Completed inners are released as they finish.
    #[must_use]
    pub fn merge_all(&self) -> Producer<T> {
        let outer = self.clone();
        Producer::new(move |sink| run_merge(&outer, &sink, Rc::new(Flatten::default())))
    }
}

impl<T: 'static> Producer<T> {
    /// Map each value to a producer and merge the results.
    #[must_use]
    pub fn merge_map<U: 'static>(&self, f: impl Fn(T) -> Producer<U> + 'static) -> Producer<U> {
        self.map(f).merge_all()
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
    fn flattens_synchronous_inners() {
        let lab = LabScheduler::new();
        let sched = lab.handle();
        let log = Log::new();
        let _sub = source::from_iter([1, 2, 3], lab.handle())
            .merge_map(move |n| source::range(1, n, sched.clone()))
            .subscribe(record(&log));
        lab.flush();
        assert_eq!(log.values(), vec![1, 1, 2, 1, 2, 3]);
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn waits_for_outer_and_inners() {
        let outer = Subject::new();
        let inner_a = Subject::new();
        let inner_b = Subject::new();
        let log = Log::new();
        let _sub = outer.as_producer().merge_all().subscribe(record(&log));

        outer.next(inner_a.as_producer());
        outer.next(inner_b.as_producer());
        inner_b.next("b");
        inner_a.next("a");
        outer.complete();
        inner_a.complete();
        assert_eq!(log.completions.get(), 0);
        inner_b.complete();
        assert_eq!(log.values(), vec!["b", "a"]);
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn inner_completing_before_outer_does_not_finish() {
        let outer = Subject::new();
        let log: Rc<Log<i32>> = Log::new();
        let _sub = outer.as_producer().merge_all().subscribe(record(&log));
        outer.next(source::empty());
        assert_eq!(log.completions.get(), 0);
        outer.complete();
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn empty_outer_completes() {
        let log: Rc<Log<u8>> = Log::new();
        let _sub = source::empty::<Producer<u8>>().merge_all().subscribe(record(&log));
        assert_eq!(log.completions.get(), 1);
    }

    #[test]
    fn inner_error_disposes_outer_and_siblings() {
        let lab = LabScheduler::new();
        let outer = Subject::new();
        let log = Log::new();
        let _sub = outer.as_producer().merge_all().subscribe(record(&log));
        outer.next(source::interval(Duration::from_millis(1), lab.handle()));
        outer.next(source::fail(StreamError::msg("inner")));
        assert!(lab.is_idle());
        assert_eq!(outer.observer_count(), 0);
        assert_eq!(*log.errors.borrow(), vec![StreamError::msg("inner")]);
    }

    #[test]
    fn dispose_cancels_inner_timers() {
        let lab = LabScheduler::new();
        let sched = lab.handle();
        let log = Log::new();
        let sub = source::from_iter([10u64, 20], lab.handle())
            .merge_map(move |ms| {
                source::timer(Duration::from_millis(ms), sched.clone()).map(move |_| ms)
            })
            .subscribe(record(&log));
        lab.flush();
        assert_eq!(lab.pending(), 2);
        lab.advance(Duration::from_millis(10));
        assert_eq!(log.values(), vec![10]);
        sub.dispose();
        assert!(lab.is_idle());
        assert_eq!(log.completions.get(), 0);
    }

    #[test]
    fn timers_complete_the_merge() {
        let lab = LabScheduler::new();
        let sched = lab.handle();
        let log = Log::new();
        let _sub = source::from_iter([30u64, 10, 20], lab.handle())
            .merge_map(move |ms| {
                source::timer(Duration::from_millis(ms), sched.clone()).map(move |_| ms)
            })
            .subscribe(record(&log));
        lab.advance(Duration::from_millis(30));
        assert_eq!(log.values(), vec![10, 20, 30]);
        assert_eq!(log.completions.get(), 1);
    }

    fn tracked_merge<T: 'static>(
        outer: Producer<Producer<T>>,
    ) -> (Producer<T>, Rc<RefCell<Option<Rc<Flatten>>>>) {
        let slot = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&slot);
        let merged = Producer::new(move |sink| {
            let book = Rc::new(Flatten::default());
            *seen.borrow_mut() = Some(Rc::clone(&book));
            run_merge(&outer, &sink, book)
        });
        (merged, slot)
    }

    fn live(slot: &RefCell<Option<Rc<Flatten>>>) -> usize {
        slot.borrow().as_ref().map_or(0, |book| book.live_count())
    }

    #[test]
    fn completed_inners_are_released() {
        let lab = LabScheduler::new();
        let sched = lab.handle();
        let clicks = Subject::new();
        let log = Log::new();
        let (merged, book) = tracked_merge(
            clicks
                .as_producer()
                .map(move |ms: u64| source::timer(Duration::from_millis(ms), sched.clone())),
        );
        let _sub = merged.subscribe(record(&log));

        for _ in 0..50 {
            clicks.next(5);
        }
        assert_eq!(live(&book), 50);
        lab.advance(Duration::from_millis(5));
        assert_eq!(log.values().len(), 50);
        assert_eq!(live(&book), 0);
        assert_eq!(log.completions.get(), 0);
        assert!(!clicks.is_closed());
    }

    #[test]
    fn synchronous_inners_are_never_held() {
        let lab = LabScheduler::new();
        let outer = Subject::new();
        let log = Log::new();
        let (merged, book) = tracked_merge(outer.as_producer());
        let _sub = merged.subscribe(record(&log));
        for n in 0..10 {
            outer.next(source::of(n, lab.handle()));
        }
        assert_eq!(live(&book), 10);
        lab.flush();
        assert_eq!(live(&book), 0);
        outer.next(source::empty());
        assert_eq!(live(&book), 0);
        assert_eq!(log.values().len(), 10);
    }

    #[test]
    fn dispose_releases_live_inners() {
        let lab = LabScheduler::new();
        let outer = Subject::new();
        let log: Rc<Log<u64>> = Log::new();
        let (merged, book) = tracked_merge(outer.as_producer());
        let sub = merged.subscribe(record(&log));
        outer.next(source::interval(Duration::from_millis(1), lab.handle()));
        outer.next(source::interval(Duration::from_millis(2), lab.handle()));
        assert_eq!(live(&book), 2);
        sub.dispose();
        assert_eq!(live(&book), 0);
        assert!(lab.is_idle());
    }
}
