#![forbid(unsafe_code)]

//! Core: push-based reactive streams.
//!
//! A [`Producer`] is a lazy description of how to push values into a
//! [`Consumer`]. Nothing happens until [`Producer::subscribe`] is called,
//! which returns a [`Subscription`] used to cancel the run. Operators build
//! new producers out of existing ones; a [`Subject`] fans a single stream out
//! to many consumers.
//!
//! # Invariants
//!
//! 1. Once a run completes or errors, no further notification reaches its
//!    consumer, and the resources it acquired are released before the
//!    terminal reaction runs.
//! 2. [`Subscription::dispose`] is idempotent and may be called from inside
//!    any reaction.
//! 3. Disposal propagates upstream through every operator in a chain.
//! 4. No reaction is invoked while an internal borrow is held, so reactions
//!    may re-enter the engine (dispose, subscribe, push into a hub).
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use rill_core::scheduler::LabScheduler;
//! use rill_core::{Consumer, source};
//!
//! let lab = LabScheduler::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//!
//! let _sub = source::from_iter([10, 3, 6, 2, 8], lab.handle())
//!     .tic()
//!     .subscribe(Consumer::from_next(move |n| sink.borrow_mut().push(n)));
//!
//! lab.flush();
//! assert_eq!(*seen.borrow(), vec![1, 2, 3, 4, 5]);
//! ```

pub mod consumer;
pub mod error;
pub mod event;
pub mod ops;
pub mod producer;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod subject;
pub mod subscription;

pub use consumer::Consumer;
pub use error::StreamError;
pub use event::{EventHub, EventSource, Listener, ListenerId};
pub use producer::Producer;
pub use scheduler::{LabScheduler, Scheduler, SchedulerRef, TaskHandle};
pub use sink::{ChainState, Sink};
pub use subject::Subject;
pub use subscription::{
    Subscription, SubscriptionGuard, SubscriptionState, subscriptions_disposed_total,
};
