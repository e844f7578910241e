#![forbid(unsafe_code)]

//! Demo wiring for rill: a simulated button panel and the reference
//! operator scenarios, runnable from the `rill-demo` binary.

pub mod cli;
pub mod error;
pub mod panel;
pub mod scenarios;

pub use cli::{run, run_from_env};
pub use error::{DemoError, Result};
