#![forbid(unsafe_code)]

//! Cancellation handles.
//!
//! A [`Subscription`] owns the teardown work of one `subscribe` call: stopping
//! timers, removing listeners, disposing upstream subscriptions. Teardowns are
//! run exactly once, in the order they were added, the first time
//! [`Subscription::dispose`] is called. Any later call is a no-op.
//!
//! # Invariants
//!
//! 1. State moves `Active -> Disposed` exactly once.
//! 2. Every teardown runs exactly once.
//! 3. A teardown added after disposal runs immediately.
//! 4. No teardown runs while the internal borrow is held, so a teardown may
//!    itself dispose this subscription (it observes `Disposed` and returns).
//!
//! Dropping a `Subscription` does **not** dispose it; disposal is always
//! explicit. Wrap it in a [`SubscriptionGuard`] for scope-bound cleanup.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

// ─── Id generation and counters ──────────────────────────────────────────────

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_subscription_id() -> u64 {
    NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Total number of subscriptions disposed.
static SUBSCRIPTIONS_DISPOSED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Read the total disposal count (for diagnostics).
#[must_use]
pub fn subscriptions_disposed_total() -> u64 {
    SUBSCRIPTIONS_DISPOSED_TOTAL.load(Ordering::Relaxed)
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Resources are held.
    Active,
    /// Resources have been released.
    Disposed,
}

enum Teardown {
    Action(Box<dyn FnOnce()>),
    Child(Subscription),
}

impl Teardown {
    fn run(self) {
        match self {
            Self::Action(f) => f(),
            Self::Child(sub) => sub.dispose(),
        }
    }
}

struct SubscriptionInner {
    id: u64,
    state: Cell<SubscriptionState>,
    teardowns: RefCell<Vec<Teardown>>,
}

/// Handle for cancelling an active push run.
///
/// Cloning creates a new handle to the **same** subscription.
#[must_use = "a subscription must be disposed to release its resources"]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

impl Clone for Subscription {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.get())
            .field("teardowns", &self.inner.teardowns.borrow().len())
            .finish()
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription {
    /// An active subscription with nothing to tear down yet.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                id: next_subscription_id(),
                state: Cell::new(SubscriptionState::Active),
                teardowns: RefCell::new(Vec::new()),
            }),
        }
    }

    /// A subscription whose only teardown is `f`.
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        let sub = Self::new();
        sub.add_fn(f);
        sub
    }

    /// An already-disposed subscription, for runs that hold no resources.
    pub fn disposed() -> Self {
        let sub = Self::new();
        sub.inner.state.set(SubscriptionState::Disposed);
        sub
    }

    /// Unique identifier (for tracing).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        self.inner.state.get()
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.state.get() == SubscriptionState::Disposed
    }

    /// Register a teardown action.
    ///
    /// Runs immediately if this subscription is already disposed.
    pub fn add_fn(&self, f: impl FnOnce() + 'static) {
        self.push(Teardown::Action(Box::new(f)));
    }

    /// Dispose `child` together with this subscription.
    ///
    /// Disposes `child` immediately if this subscription is already disposed.
    pub fn add(&self, child: Subscription) {
        if Rc::ptr_eq(&self.inner, &child.inner) {
            return;
        }
        self.push(Teardown::Child(child));
    }

    fn push(&self, teardown: Teardown) {
        if self.is_disposed() {
            teardown.run();
            return;
        }
        self.inner.teardowns.borrow_mut().push(teardown);
    }

    /// Release every resource held by this subscription.
    ///
    /// Idempotent: only the first call has an effect.
    pub fn dispose(&self) {
        if self.inner.state.replace(SubscriptionState::Disposed) == SubscriptionState::Disposed {
            return;
        }
        SUBSCRIPTIONS_DISPOSED_TOTAL.fetch_add(1, Ordering::Relaxed);
        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        trace!(
            subscription_id = self.inner.id,
            teardowns = teardowns.len(),
            "subscription disposed"
        );
        for teardown in teardowns {
            teardown.run();
        }
    }

    /// Convert into a guard that disposes when dropped.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { sub: Some(self) }
    }
}

/// RAII guard that disposes its subscription on drop.
#[must_use = "dropping the guard disposes the subscription immediately"]
#[derive(Debug)]
pub struct SubscriptionGuard {
    sub: Option<Subscription>,
}

impl SubscriptionGuard {
    /// Give up the guard without disposing, returning the subscription.
    pub fn release(mut self) -> Subscription {
        self.sub.take().unwrap_or_else(Subscription::disposed)
    }

    /// Borrow the guarded subscription.
    pub fn subscription(&self) -> Option<&Subscription> {
        self.sub.as_ref()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(sub) = self.sub.take() {
            sub.dispose();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
