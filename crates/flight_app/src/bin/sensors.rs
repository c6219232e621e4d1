//! # sensors — Sensor simulator process
//!
//! Publishes random sensor deltas on `flight_control.sensor.data` and
//! listens on `flight_control.sensor.update` until the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use flight_app::actors::run_sensors;
use flight_app::cli::{ActorArgs, init_tracing, interrupt_on_ctrl_c};
use flight_net::Bus;
use flight_system::ActorRunner;

/// Sensor simulator.
#[derive(Debug, Parser)]
#[command(name = "sensors", version, about)]
struct Cli {
    #[command(flatten)]
    actor: ActorArgs,

    /// Milliseconds between generated batches.
    #[arg(long, default_value_t = 4000)]
    period_ms: u64,

    /// Seed for the generator (random when omitted).
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("sensors")?;

    let config = cli.actor.config("sensors");
    let bus = ActorRunner::new(config.clone()).connect().await?;
    let bus: Arc<dyn Bus> = Arc::new(bus);

    let interrupt = interrupt_on_ctrl_c();

    let rng = cli
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    run_sensors(
        Arc::clone(&bus),
        config,
        rng,
        Duration::from_millis(cli.period_ms),
        interrupt,
    )
    .await?;

    bus.close().await?;
    info!("sensors shut down");
    Ok(())
}
