#![forbid(unsafe_code)]

//! rill public facade crate.
//!
//! Re-exports the stream engine and, with the `runtime` feature (on by
//! default), the wall-clock runtime.

pub use rill_core::*;

#[cfg(feature = "runtime")]
pub use rill_runtime as runtime;

pub mod prelude {
    pub use rill_core as core;
    #[cfg(feature = "runtime")]
    pub use rill_runtime as runtime;

    pub use rill_core::{
        Consumer, EventHub, EventSource, LabScheduler, Producer, Scheduler, SchedulerRef,
        StreamError, Subject, Subscription, source,
    };
    #[cfg(feature = "runtime")]
    pub use rill_runtime::{LocalScheduler, RuntimeConfig};
}
