#![forbid(unsafe_code)]

//! Bounded prefixes and last values.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::relay;
use crate::consumer::Consumer;
use crate::producer::Producer;
use crate::subscription::Subscription;

impl<T: 'static> Producer<T> {
    /// Forward the first `n` values, then complete and dispose upstream.
    ///
    /// `take(0)` completes at once without subscribing upstream.
    #[must_use]
    pub fn take(&self, n: usize) -> Producer<T> {
        let upstream = self.clone();
        Producer::new(move |sink| {
            if n == 0 {
                sink.complete();
                return Subscription::disposed();
            }
            let seen = Cell::new(0usize);
            let down = sink.clone();
            upstream.subscribe(relay(&sink).on_next(move |v| {
                let count = seen.get() + 1;
                if count > n {
                    return;
                }
                seen.set(count);
                down.next(v);
                if count == n {
                    down.complete();
                }
            }))
        })
    }

    /// On upstream completion, emit the most recent value (if any), then
    /// complete. Errors pass through and discard the held value.
    #[must_use]
    pub fn take_last(&self) -> Producer<T> {
        let upstream = self.clone();
        Producer::new(move |sink| {
            let last: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let (held, flushed) = (Rc::clone(&last), last);
            let (e, c) = (sink.clone(), sink.clone());
            upstream.subscribe(
                Consumer::new()
                    .on_next(move |v| *held.borrow_mut() = Some(v))
                    .on_error(move |err| e.error(err))
                    .on_complete(move || {
                        let value = flushed.borrow_mut().take();
                        if let Some(v) = value {
                            c.next(v);
                        }
                        c.complete();
                    }),
            )
        })
    }
}
