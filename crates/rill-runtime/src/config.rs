#![forbid(unsafe_code)]

//! Run-loop configuration.
//!
//! Defaults come from [`RuntimeConfig::default`]; environment variables
//! override them through [`RuntimeConfig::from_env`]:
//!
//! | Variable | Field | Format |
//! |---|---|---|
//! | `RILL_MAX_IDLE_SLEEP_MS` | `max_idle_sleep` | milliseconds, `> 0` |
//! | `RILL_RUN_DEADLINE_MS` | `run_deadline` | milliseconds, `0` disables |
//! | `RILL_LOG_FORMAT` | `log_format` | `pretty`, `compact`, or `json` |

use std::time::Duration;

use thiserror::Error;

use crate::logging::LogFormat;

pub const ENV_MAX_IDLE_SLEEP_MS: &str = "RILL_MAX_IDLE_SLEEP_MS";
pub const ENV_RUN_DEADLINE_MS: &str = "RILL_RUN_DEADLINE_MS";
pub const ENV_LOG_FORMAT: &str = "RILL_LOG_FORMAT";

const DEFAULT_MAX_IDLE_SLEEP: Duration = Duration::from_millis(50);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("unknown log format: {value:?} (expected pretty, compact, or json)")]
    UnknownLogFormat { value: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

/// Tuning for [`LocalScheduler`](crate::LocalScheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Longest single sleep while waiting for the next task.
    pub max_idle_sleep: Duration,
    /// Stop [`run`](crate::LocalScheduler::run) after this long, if set.
    pub run_deadline: Option<Duration>,
    /// Output format used by [`logging::init`](crate::logging::init).
    pub log_format: LogFormat,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_idle_sleep: DEFAULT_MAX_IDLE_SLEEP,
            run_deadline: None,
            log_format: LogFormat::default(),
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn with_max_idle_sleep(mut self, max_idle_sleep: Duration) -> Self {
        self.max_idle_sleep = max_idle_sleep;
        self
    }

    #[must_use]
    pub fn with_run_deadline(mut self, run_deadline: Option<Duration>) -> Self {
        self.run_deadline = run_deadline;
        self
    }

    #[must_use]
    pub fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_MAX_IDLE_SLEEP_MS) {
            let ms = parse_ms(ENV_MAX_IDLE_SLEEP_MS, &value)?;
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    var: ENV_MAX_IDLE_SLEEP_MS,
                    value,
                    reason: "must be greater than zero",
                });
            }
            config.max_idle_sleep = Duration::from_millis(ms);
        }
        if let Some(value) = lookup(ENV_RUN_DEADLINE_MS) {
            let ms = parse_ms(ENV_RUN_DEADLINE_MS, &value)?;
            config.run_deadline = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            config.log_format = value.parse()?;
        }
        Ok(config)
    }
}

fn parse_ms(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: "expected a whole number of milliseconds",
    })
}
