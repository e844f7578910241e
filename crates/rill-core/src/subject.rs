#![forbid(unsafe_code)]

//! Multicast hub.
//!
//! A [`Subject`] is both a consumer and a producer: values pushed into it are
//! rebroadcast to every registered consumer.
//!
//! # Invariants
//!
//! 1. Consumers are notified in registration order.
//! 2. Each broadcast iterates a snapshot of the registry taken when the
//!    broadcast starts; consumers registered by a reaction during the
//!    broadcast do not receive the in-flight value.
//! 3. A consumer whose subscription was disposed (even by a reaction during
//!    the broadcast) receives nothing further.
//! 4. After `complete` or `error` the hub is closed: the registry is cleared,
//!    later pushes are ignored, and late subscribers immediately receive the
//!    stored terminal notification.
//!
//! # Failure Modes
//!
//! - Broadcasting to zero consumers is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::consumer::Consumer;
use crate::error::StreamError;
use crate::producer::Producer;
use crate::sink::Sink;
use crate::subscription::Subscription;

#[derive(Debug, Clone)]
enum Terminal {
    Completed,
    Errored(StreamError),
}

struct HubState<T> {
    observers: Vec<(u64, Sink<T>)>,
    next_key: u64,
    terminal: Option<Terminal>,
}

/// A consumer-and-producer hybrid that fans notifications out.
///
/// Cloning creates a new handle to the **same** hub.
pub struct Subject<T> {
    state: Rc<RefCell<HubState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Subject")
            .field("observers", &state.observers.len())
            .field("terminal", &state.terminal)
            .finish()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create an open hub with no consumers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                observers: Vec::new(),
                next_key: 0,
                terminal: None,
            })),
        }
    }

    /// Number of currently registered consumers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Whether `complete` or `error` has been delivered.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().terminal.is_some()
    }

    /// Broadcast a value.
    pub fn next(&self, value: T) {
        let snapshot: Vec<Sink<T>> = {
            let state = self.state.borrow();
            if state.terminal.is_some() {
                return;
            }
            state.observers.iter().map(|(_, s)| s.clone()).collect()
        };
        trace!(observers = snapshot.len(), "hub broadcast");
        for sink in snapshot {
            sink.next(value.clone());
        }
    }

    /// Broadcast an error and close the hub.
    pub fn error(&self, err: StreamError) {
        let Some(snapshot) = self.close(Terminal::Errored(err.clone())) else {
            return;
        };
        for sink in snapshot {
            sink.error(err.clone());
        }
    }

    /// Broadcast completion and close the hub.
    pub fn complete(&self) {
        let Some(snapshot) = self.close(Terminal::Completed) else {
            return;
        };
        for sink in snapshot {
            sink.complete();
        }
    }

    fn close(&self, terminal: Terminal) -> Option<Vec<Sink<T>>> {
        let mut state = self.state.borrow_mut();
        if state.terminal.is_some() {
            return None;
        }
        state.terminal = Some(terminal);
        let observers = std::mem::take(&mut state.observers);
        Some(observers.into_iter().map(|(_, s)| s).collect())
    }

    /// Register a consumer.
    ///
    /// Disposing the returned subscription deregisters it.
    pub fn subscribe(&self, consumer: Consumer<T>) -> Subscription {
        self.as_producer().subscribe(consumer)
    }

    /// Read-only producer view hiding the broadcast operations.
    #[must_use]
    pub fn as_producer(&self) -> Producer<T> {
        let state = Rc::clone(&self.state);
        Producer::new(move |sink| register(&state, sink))
    }

    /// A consumer that pushes into this hub, for feeding it from a producer.
    #[must_use]
    pub fn to_consumer(&self) -> Consumer<T> {
        let (n, e, c) = (self.clone(), self.clone(), self.clone());
        Consumer::new()
            .on_next(move |v| n.next(v))
            .on_error(move |err| e.error(err))
            .on_complete(move || c.complete())
    }
}

fn register<T: Clone + 'static>(state: &Rc<RefCell<HubState<T>>>, sink: Sink<T>) -> Subscription {
    let key = {
        let mut st = state.borrow_mut();
        if let Some(terminal) = st.terminal.clone() {
            drop(st);
            match terminal {
                Terminal::Completed => sink.complete(),
                Terminal::Errored(err) => sink.error(err),
            }
            return Subscription::disposed();
        }
        let key = st.next_key;
        st.next_key += 1;
        st.observers.push((key, sink));
        key
    };

    let weak: Weak<RefCell<HubState<T>>> = Rc::downgrade(state);
    Subscription::from_fn(move || {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let removed = {
            let mut st = state.borrow_mut();
            st.observers
                .iter()
                .position(|(k, _)| *k == key)
                .map(|idx| st.observers.remove(idx))
        };
        drop(removed);
    })
}
