//! # simulation — Controller, sensors and actuators in one process
//!
//! Runs the whole feedback loop over the in-memory bus; no NATS server
//! is needed.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use flight_app::cli::{ActorArgs, init_tracing, interrupt_on_ctrl_c};
use flight_app::control::ControlOptions;
use flight_app::simulation::{SimulationOptions, run_simulation};

/// In-process flight control simulation.
#[derive(Debug, Parser)]
#[command(name = "simulation", version, about)]
struct Cli {
    #[command(flatten)]
    actor: ActorArgs,

    /// Seconds before the landing signal is sent.
    #[arg(long, default_value_t = 30)]
    landing_after: u64,

    /// Seconds between flight state log lines.
    #[arg(long, default_value_t = 5)]
    monitor_every: u64,

    /// Milliseconds between generated sensor batches.
    #[arg(long, default_value_t = 4000)]
    period_ms: u64,

    /// Seed for the sensor generator (random when omitted).
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("simulation")?;

    let interrupt = interrupt_on_ctrl_c();

    let options = SimulationOptions {
        control: ControlOptions {
            landing_after: Duration::from_secs(cli.landing_after),
            monitor_every: Duration::from_secs(cli.monitor_every),
        },
        sensor_period: Duration::from_millis(cli.period_ms),
        seed: cli.seed,
    };
    run_simulation(&cli.actor, options, interrupt).await?;
    Ok(())
}
