#![forbid(unsafe_code)]

//! Running accumulation and buffering.
//!
//! [`scan`](Producer::scan) is the primitive: one accumulator per run,
//! seeded fresh on every subscribe. [`sum`](Producer::sum),
//! [`reduce`](Producer::reduce) and [`tic`](Producer::tic) are compositions
//! of it.

use std::cell::RefCell;
use std::ops::Add;
use std::rc::Rc;

use super::relay;
use crate::consumer::Consumer;
use crate::producer::Producer;

impl<T: 'static> Producer<T> {
    /// Emit the running accumulation `f(acc, value)` after every value.
    #[must_use]
    pub fn scan<A, F>(&self, seed: A, f: F) -> Producer<A>
    where
        A: Clone + 'static,
        F: Fn(A, T) -> A + 'static,
    {
        let upstream = self.clone();
        let f = Rc::new(f);
        Producer::new(move |sink| {
            let acc = RefCell::new(seed.clone());
            let f = Rc::clone(&f);
            let down = sink.clone();
            upstream.subscribe(relay(&sink).on_next(move |v| {
                let current = acc.borrow().clone();
                let next = f(current, v);
                *acc.borrow_mut() = next.clone();
                down.next(next);
            }))
        })
    }

    /// Emit all values as one `Vec` when upstream completes.
    ///
    /// An empty upstream yields an empty `Vec`.
    #[must_use]
    pub fn join(&self) -> Producer<Vec<T>> {
        let upstream = self.clone();
        Producer::new(move |sink| {
            let buffer: Rc<RefCell<Vec<T>>> = Rc::new(RefCell::new(Vec::new()));
            let (push, drain) = (Rc::clone(&buffer), buffer);
            let (e, c) = (sink.clone(), sink.clone());
            upstream.subscribe(
                Consumer::new()
                    .on_next(move |v| push.borrow_mut().push(v))
                    .on_error(move |err| e.error(err))
                    .on_complete(move || {
                        let all = std::mem::take(&mut *drain.borrow_mut());
                        c.next(all);
                        c.complete();
                    }),
            )
        })
    }

    /// Running count of values.
    #[must_use]
    pub fn tic(&self) -> Producer<u64> {
        self.uno().sum()
    }
}

impl<T> Producer<T>
where
    T: Clone + Default + Add<Output = T> + 'static,
{
    /// Emit the running sum, starting from `T::default()`.
    #[must_use]
    pub fn sum(&self) -> Producer<T> {
        self.scan(T::default(), |acc, v| acc + v)
    }

    /// Emit only the final sum, on completion.
    ///
    /// An empty upstream completes without a value.
    #[must_use]
    pub fn reduce(&self) -> Producer<T> {
        self.sum().take_last()
    }
}
