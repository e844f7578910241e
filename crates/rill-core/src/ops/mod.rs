#![forbid(unsafe_code)]

//! Operators: producers built from producers.
//!
//! Every operator is an inherent method on [`Producer`] that returns a new
//! producer. Subscribing to the result subscribes upstream with a wrapping
//! consumer; disposing the result disposes upstream. Errors and completion
//! pass through unchanged unless the operator says otherwise.
//!
//! | Group | Operators |
//! |---|---|
//! | transform | [`map`](Producer::map), [`filter`](Producer::filter), [`tap`](Producer::tap), [`uno`](Producer::uno) |
//! | take | [`take`](Producer::take), [`take_last`](Producer::take_last) |
//! | accumulate | [`scan`](Producer::scan), [`sum`](Producer::sum), [`reduce`](Producer::reduce), [`tic`](Producer::tic), [`join`](Producer::join) |
//! | combine | [`merge`](Producer::merge), [`merge_with`](Producer::merge_with) |
//! | flatten | [`merge_all`](Producer::merge_all), [`merge_map`](Producer::merge_map) |
//! | multicast | [`share`](Producer::share) |

mod accumulate;
mod combine;
mod flatten;
mod share;
mod take;
mod transform;

use crate::consumer::Consumer;
use crate::sink::Sink;

#[cfg(doc)]
use crate::producer::Producer;

/// A consumer forwarding error and completion into `sink`; the caller adds
/// the value reaction.
pub(crate) fn relay<T, U: 'static>(sink: &Sink<U>) -> Consumer<T> {
    let (e, c) = (sink.clone(), sink.clone());
    Consumer::new()
        .on_error(move |err| e.error(err))
        .on_complete(move || c.complete())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording consumer shared by operator tests.

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::consumer::Consumer;
    use crate::error::StreamError;

    pub struct Log<T> {
        pub values: RefCell<Vec<T>>,
        pub errors: RefCell<Vec<StreamError>>,
        pub completions: Cell<u32>,
    }

    impl<T> Log<T> {
        pub fn new() -> Rc<Self> {
            Rc::new(Self {
                values: RefCell::new(Vec::new()),
                errors: RefCell::new(Vec::new()),
                completions: Cell::new(0),
            })
        }
    }

    impl<T: Clone> Log<T> {
        pub fn values(&self) -> Vec<T> {
            self.values.borrow().clone()
        }
    }

    pub fn record<T: 'static>(log: &Rc<Log<T>>) -> Consumer<T> {
        let (v, e, c) = (Rc::clone(log), Rc::clone(log), Rc::clone(log));
        Consumer::new()
            .on_next(move |x| v.values.borrow_mut().push(x))
            .on_error(move |err| e.errors.borrow_mut().push(err))
            .on_complete(move || c.completions.set(c.completions.get() + 1))
    }
}
