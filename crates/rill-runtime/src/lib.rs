#![forbid(unsafe_code)]

//! Runtime: drives rill streams against the wall clock.
//!
//! - [`LocalScheduler`]: a single-threaded run loop implementing
//!   [`rill_core::Scheduler`].
//! - [`RuntimeConfig`]: run-loop tuning, with environment overrides.
//! - [`logging::init`]: installs a `tracing` subscriber.
//!
//! ```no_run
//! use std::time::Duration;
//! use rill_core::source;
//! use rill_runtime::{LocalScheduler, RuntimeConfig};
//!
//! let config = RuntimeConfig::default().with_run_deadline(Some(Duration::from_secs(1)));
//! let runtime = LocalScheduler::new(&config);
//! let _sub = source::interval(Duration::from_millis(100), runtime.handle())
//!     .take(3)
//!     .subscribe_next(|n| println!("tick {n}"));
//! let report = runtime.run();
//! println!("{report:?}");
//! ```

pub mod config;
pub mod local;
pub mod logging;

pub use config::{ConfigError, RuntimeConfig};
pub use local::{LocalScheduler, RunOutcome, RunReport, StopHandle};
pub use logging::LogFormat;
