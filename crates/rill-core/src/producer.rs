#![forbid(unsafe_code)]

//! Lazy push sources.
//!
//! A [`Producer`] is an immutable value describing how to start pushing into
//! a [`Sink`]. It does nothing until subscribed, and every subscription is an
//! independent run. Operators (see [`crate::ops`]) are inherent methods that
//! return new producers wrapping this one.
//!
//! # Writing a producer
//!
//! The closure passed to [`Producer::new`] receives the run's sink and returns
//! a [`Subscription`] owning whatever it acquired. That subscription is
//! attached to the sink, so it is released when the run terminates or when
//! the caller disposes.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use rill_core::{Consumer, Producer, Subscription};
//!
//! let answer = Producer::new(|sink| {
//!     sink.next(42);
//!     sink.complete();
//!     Subscription::disposed()
//! });
//!
//! let got = Rc::new(Cell::new(0));
//! let g = Rc::clone(&got);
//! let _sub = answer.subscribe(Consumer::from_next(move |v| g.set(v)));
//! assert_eq!(got.get(), 42);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::consumer::Consumer;
use crate::sink::Sink;
use crate::subscription::Subscription;

type OnSubscribe<T> = dyn Fn(Sink<T>) -> Subscription;

/// A lazily-started, reusable push source.
///
/// Cloning a `Producer` is cheap and yields the same description.
pub struct Producer<T> {
    on_subscribe: Rc<OnSubscribe<T>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            on_subscribe: Rc::clone(&self.on_subscribe),
        }
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

impl<T: 'static> Producer<T> {
    /// Build a producer from its subscribe function.
    #[must_use]
    pub fn new(on_subscribe: impl Fn(Sink<T>) -> Subscription + 'static) -> Self {
        Self {
            on_subscribe: Rc::new(on_subscribe),
        }
    }

    /// Start a run pushing into `consumer`.
    ///
    /// Always returns synchronously. Depending on the producer, values may be
    /// pushed before this returns or on a later scheduler turn.
    pub fn subscribe(&self, consumer: Consumer<T>) -> Subscription {
        let sink = Sink::new(consumer);
        self.subscribe_sink(&sink);
        sink.subscription()
    }

    /// Start a run that only reacts to values.
    pub fn subscribe_next(&self, f: impl Fn(T) + 'static) -> Subscription {
        self.subscribe(Consumer::from_next(f))
    }

    /// Start a run pushing into an existing sink.
    ///
    /// The run's resources are attached to the sink's subscription.
    pub fn subscribe_sink(&self, sink: &Sink<T>) {
        let resources = (self.on_subscribe)(sink.clone());
        sink.add(resources);
    }
}
