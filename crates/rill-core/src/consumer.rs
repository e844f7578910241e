#![forbid(unsafe_code)]

//! The three-reaction sink that receives pushed notifications.
//!
//! A [`Consumer`] is assembled from any subset of `next`, `error`, and
//! `complete` reactions. Missing reactions are silent no-ops, so callers only
//! spell out what they care about:
//!
//! ```
//! use rill_core::Consumer;
//!
//! let c: Consumer<i32> = Consumer::new().on_complete(|| println!("done"));
//! c.next(1); // no next reaction: ignored
//! c.complete();
//! ```
//!
//! Reactions are shared `Fn` closures. Cloning a consumer is cheap and the
//! engine can take a reaction out of its bookkeeping before calling it, which
//! keeps re-entrant calls (a reaction that disposes its own subscription)
//! free of borrow conflicts.

use std::fmt;
use std::rc::Rc;

use crate::error::StreamError;

type NextFn<T> = Rc<dyn Fn(T)>;
type ErrorFn = Rc<dyn Fn(StreamError)>;
type CompleteFn = Rc<dyn Fn()>;

/// A partial set of reactions with no-op defaults.
pub struct Consumer<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

impl<T> Default for Consumer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("next", &self.next.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

impl<T> Consumer<T> {
    /// A consumer with no reactions at all.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    /// A consumer that only reacts to values.
    #[must_use]
    pub fn from_next(f: impl Fn(T) + 'static) -> Self {
        Self::new().on_next(f)
    }

    /// Set the value reaction (builder pattern).
    #[must_use]
    pub fn on_next(mut self, f: impl Fn(T) + 'static) -> Self {
        self.next = Some(Rc::new(f));
        self
    }

    /// Set the error reaction (builder pattern).
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(StreamError) + 'static) -> Self {
        self.error = Some(Rc::new(f));
        self
    }

    /// Set the completion reaction (builder pattern).
    #[must_use]
    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.complete = Some(Rc::new(f));
        self
    }

    /// Deliver a value.
    pub fn next(&self, value: T) {
        if let Some(f) = &self.next {
            f(value);
        }
    }

    /// Deliver an error.
    pub fn error(&self, err: StreamError) {
        if let Some(f) = &self.error {
            f(err);
        }
    }

    /// Deliver completion.
    pub fn complete(&self) {
        if let Some(f) = &self.complete {
            f();
        }
    }

    pub(crate) fn next_fn(&self) -> Option<NextFn<T>> {
        self.next.clone()
    }

    pub(crate) fn error_fn(&self) -> Option<ErrorFn> {
        self.error.clone()
    }

    pub(crate) fn complete_fn(&self) -> Option<CompleteFn> {
        self.complete.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn empty_consumer_ignores_everything() {
        let c: Consumer<u8> = Consumer::new();
        c.next(1);
        c.error(StreamError::msg("ignored"));
        c.complete();
    }

    #[test]
    fn reactions_are_forwarded() {
        let values = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(Cell::new(0));
        let done = Rc::new(Cell::new(false));

        let (v, e, d) = (Rc::clone(&values), Rc::clone(&errors), Rc::clone(&done));
        let c = Consumer::new()
            .on_next(move |x: i32| v.borrow_mut().push(x))
            .on_error(move |_| e.set(e.get() + 1))
            .on_complete(move || d.set(true));

        c.next(4);
        c.next(5);
        c.error(StreamError::msg("x"));
        c.complete();

        assert_eq!(*values.borrow(), vec![4, 5]);
        assert_eq!(errors.get(), 1);
        assert!(done.get());
    }

    #[test]
    fn partial_consumer_only_has_complete() {
        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);
        let c: Consumer<&str> = Consumer::new().on_complete(move || d.set(d.get() + 1));
        c.next("dropped");
        c.error(StreamError::msg("dropped"));
        c.complete();
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn clone_shares_reactions() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let c1 = Consumer::from_next(move |_: ()| h.set(h.get() + 1));
        let c2 = c1.clone();
        c1.next(());
        c2.next(());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn debug_reports_present_reactions() {
        let c: Consumer<i32> = Consumer::new().on_complete(|| {});
        let dbg = format!("{c:?}");
        assert!(dbg.contains("next: false"));
        assert!(dbg.contains("complete: true"));
    }
}
