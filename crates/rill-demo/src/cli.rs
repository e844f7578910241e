//! Command-line interface.
//!
//! Flags override `RILL_DEMO_*` environment variables, which override the
//! built-in defaults. Runtime tuning (`RILL_MAX_IDLE_SLEEP_MS`,
//! `RILL_RUN_DEADLINE_MS`, `RILL_LOG_FORMAT`) is read by
//! [`RuntimeConfig::from_env`].

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rill_core::Scheduler;
use rill_runtime::{LocalScheduler, LogFormat, RunOutcome, RuntimeConfig, logging};
use tracing::info;

use crate::error::{DemoError, Result};
use crate::panel::{self, PanelPlan};
use crate::scenarios::{self, SCENARIOS};

pub const ENV_CLICKS: &str = "RILL_DEMO_CLICKS";
pub const ENV_CLICK_EVERY_MS: &str = "RILL_DEMO_CLICK_EVERY_MS";
pub const ENV_TICK_MS: &str = "RILL_DEMO_TICK_MS";
pub const ENV_SCENARIO: &str = "RILL_DEMO_SCENARIO";

#[derive(Debug, Parser)]
#[command(
    name = "rill-demo",
    about = "Drive a simulated button panel and reference scenarios with rill streams",
    version
)]
pub struct Cli {
    /// Log output format: pretty, compact, or json.
    #[arg(long = "log-format", global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Press scripted buttons on a timer and report the counter.
    Clicks(ClicksArgs),

    /// Run the reference operator scenarios.
    Scenarios(ScenariosArgs),

    /// Print scenario names.
    #[command(name = "list-scenarios")]
    ListScenarios,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ClicksArgs {
    /// Number of scripted clicks.
    #[arg(long)]
    pub clicks: Option<u32>,

    /// Milliseconds between clicks.
    #[arg(long = "click-every-ms")]
    pub click_every_ms: Option<u64>,

    /// Milliseconds between ticks.
    #[arg(long = "tick-ms")]
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScenariosArgs {
    /// Run only this scenario.
    #[arg(long)]
    pub only: Option<String>,
}

fn env_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DemoError::invalid(format!("{var}={raw:?} is not a number"))),
    }
}

impl ClicksArgs {
    /// Resolve flags, then `lookup`ed environment values, then defaults.
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<PanelPlan> {
        let defaults = PanelPlan::default();
        let clicks = match self.clicks {
            Some(n) => n,
            None => env_number(&lookup, ENV_CLICKS)?.unwrap_or(defaults.clicks),
        };
        let click_every = match self.click_every_ms {
            Some(ms) => Duration::from_millis(ms),
            None => env_number(&lookup, ENV_CLICK_EVERY_MS)?
                .map_or(defaults.click_every, Duration::from_millis),
        };
        let tick_every = match self.tick_ms {
            Some(ms) => Duration::from_millis(ms),
            None => env_number(&lookup, ENV_TICK_MS)?
                .map_or(defaults.tick_every, Duration::from_millis),
        };
        if click_every.is_zero() || tick_every.is_zero() {
            return Err(DemoError::invalid("periods must be at least 1 ms"));
        }
        Ok(PanelPlan {
            clicks,
            click_every,
            tick_every,
        })
    }
}

impl ScenariosArgs {
    /// Scenario names to run, in order.
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Vec<&'static str>> {
        let only = self.only.clone().or_else(|| lookup(ENV_SCENARIO));
        match only {
            None => Ok(SCENARIOS.to_vec()),
            Some(name) => SCENARIOS
                .iter()
                .find(|s| **s == name)
                .map(|s| vec![*s])
                .ok_or(DemoError::UnknownScenario { name }),
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let mut config = RuntimeConfig::from_env()?;
    if let Some(format) = cli.log_format {
        config = config.with_log_format(format);
    }
    logging::init(config.log_format)?;
    run(cli, &config)
}

pub fn run(cli: Cli, config: &RuntimeConfig) -> Result<()> {
    match cli.command {
        Commands::Clicks(args) => run_clicks(&args.resolve(env_lookup)?, config),
        Commands::Scenarios(args) => run_scenarios(&args.resolve(env_lookup)?, config),
        Commands::ListScenarios => {
            for name in SCENARIOS {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_clicks(plan: &PanelPlan, config: &RuntimeConfig) -> Result<()> {
    let runtime = LocalScheduler::new(config);
    let stop = runtime.stop_handle();
    info!(?plan, "panel starting");
    let panel = panel::wire(plan, runtime.handle(), move || stop.stop());
    let report = runtime.run();
    panel.dispose();

    let summary = panel.summary();
    println!(
        "clicks={} total={} ticks={} elapsed_ms={}",
        summary.clicks,
        summary.total,
        summary.ticks,
        report.elapsed.as_millis()
    );
    match report.outcome {
        RunOutcome::DeadlineReached => Err(DemoError::exit(
            3,
            format!(
                "deadline reached after {} of {} clicks",
                summary.clicks, plan.clicks
            ),
        )),
        RunOutcome::Idle | RunOutcome::Stopped => Ok(()),
    }
}

fn run_scenarios(names: &[&str], config: &RuntimeConfig) -> Result<()> {
    for name in names {
        let runtime = LocalScheduler::new(config);
        let scenario = scenarios::build(name, &runtime.handle())
            .ok_or_else(|| DemoError::UnknownScenario {
                name: (*name).to_string(),
            })?;
        let lines = scenarios::collect(&scenario, || {
            runtime.run();
        })?;
        let at_ms = u64::try_from(runtime.now().as_millis()).unwrap_or(u64::MAX);
        info!(scenario = name, at_ms, "scenario finished");
        for line in lines {
            println!("{name}: {line}");
        }
    }
    Ok(())
}
