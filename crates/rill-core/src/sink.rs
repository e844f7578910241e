#![forbid(unsafe_code)]

//! The guarded delivery record a producer pushes into.
//!
//! Every `subscribe` call creates one [`Sink`]. It pairs the caller's
//! [`Consumer`] with the run's [`Subscription`] and an explicit
//! [`ChainState`], and is the only path by which notifications reach the
//! consumer.
//!
//! # Invariants
//!
//! 1. Notifications are delivered only while the state is `Active`.
//! 2. `complete`/`error` flip the state first, then dispose the subscription
//!    (releasing upstream resources), then run the terminal reaction.
//! 3. Disposing the subscription from outside moves the state to `Disposed`.
//! 4. The consumer is dropped as soon as the state leaves `Active`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::consumer::Consumer;
use crate::error::StreamError;
use crate::subscription::Subscription;

/// Lifecycle of one subscription chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Notifications flow.
    Active,
    /// `complete` was delivered.
    Completed,
    /// `error` was delivered.
    Errored,
    /// The subscriber cancelled before any terminal notification.
    Disposed,
}

struct SinkInner<T> {
    state: Cell<ChainState>,
    consumer: RefCell<Option<Consumer<T>>>,
    subscription: Subscription,
}

/// Per-subscription delivery record.
///
/// Cloning creates a new handle to the **same** record.
pub struct Sink<T> {
    inner: Rc<SinkInner<T>>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("state", &self.inner.state.get())
            .field("subscription", &self.inner.subscription.id())
            .finish()
    }
}

impl<T: 'static> Sink<T> {
    /// Wrap `consumer` in a fresh, active sink.
    #[must_use]
    pub fn new(consumer: Consumer<T>) -> Self {
        let inner = Rc::new(SinkInner {
            state: Cell::new(ChainState::Active),
            consumer: RefCell::new(Some(consumer)),
            subscription: Subscription::new(),
        });

        let weak = Rc::downgrade(&inner);
        inner.subscription.add_fn(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.state.get() == ChainState::Active {
                    inner.state.set(ChainState::Disposed);
                }
                let released = inner.consumer.borrow_mut().take();
                drop(released);
            }
        });

        Self { inner }
    }

    /// Current chain state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ChainState {
        self.inner.state.get()
    }

    /// Whether notifications are still delivered.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.get() == ChainState::Active
    }

    /// Whether the chain has ended (terminal notification or disposal).
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.is_active()
    }

    /// A handle to the subscription governing this run.
    pub fn subscription(&self) -> Subscription {
        self.inner.subscription.clone()
    }

    /// Release `child` when this run ends.
    pub fn add(&self, child: Subscription) {
        self.inner.subscription.add(child);
    }

    /// Run `f` when this run ends.
    pub fn add_fn(&self, f: impl FnOnce() + 'static) {
        self.inner.subscription.add_fn(f);
    }

    /// Push a value downstream.
    pub fn next(&self, value: T) {
        if !self.is_active() {
            return;
        }
        let reaction = self
            .inner
            .consumer
            .borrow()
            .as_ref()
            .and_then(Consumer::next_fn);
        if let Some(f) = reaction {
            f(value);
        }
    }

    /// Terminate the run with an error.
    pub fn error(&self, err: StreamError) {
        if !self.is_active() {
            return;
        }
        self.inner.state.set(ChainState::Errored);
        let reaction = self
            .inner
            .consumer
            .borrow()
            .as_ref()
            .and_then(Consumer::error_fn);
        debug!(
            subscription_id = self.inner.subscription.id(),
            error = err.as_label(),
            "chain errored"
        );
        self.inner.subscription.dispose();
        if let Some(f) = reaction {
            f(err);
        }
    }

    /// Terminate the run normally.
    pub fn complete(&self) {
        if !self.is_active() {
            return;
        }
        self.inner.state.set(ChainState::Completed);
        let reaction = self
            .inner
            .consumer
            .borrow()
            .as_ref()
            .and_then(Consumer::complete_fn);
        debug!(
            subscription_id = self.inner.subscription.id(),
            "chain completed"
        );
        self.inner.subscription.dispose();
        if let Some(f) = reaction {
            f();
        }
    }

    /// A consumer that forwards every notification into this sink.
    #[must_use]
    pub fn to_consumer(&self) -> Consumer<T> {
        let (n, e, c) = (self.clone(), self.clone(), self.clone());
        Consumer::new()
            .on_next(move |v| n.next(v))
            .on_error(move |err| e.error(err))
            .on_complete(move || c.complete())
    }
}
