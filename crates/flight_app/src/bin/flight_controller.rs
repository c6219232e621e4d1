//! # flight_controller — Decision engine process
//!
//! ## Startup Sequence
//!
//! 1. Connect to NATS (`--nats-url`, `NATS_URL`, default `nats://localhost:4222`).
//! 2. Subscribe to `flight_control.*.data`.
//! 3. After `--landing-after` seconds, signal the simulators to land.
//! 4. On touchdown, broadcast shutdown, drain, log the summary and exit.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use flight_app::cli::{ActorArgs, init_tracing, interrupt_on_ctrl_c};
use flight_app::control::{ControlOptions, run_controller};
use flight_net::Bus;
use flight_system::ActorRunner;

/// Flight control decision engine.
#[derive(Debug, Parser)]
#[command(name = "flight_controller", version, about)]
struct Cli {
    #[command(flatten)]
    actor: ActorArgs,

    /// Seconds before the landing signal is sent.
    #[arg(long, default_value_t = 30)]
    landing_after: u64,

    /// Seconds between flight state log lines.
    #[arg(long, default_value_t = 5)]
    monitor_every: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("flight_controller")?;

    let config = cli.actor.config("flight_control");
    let bus = ActorRunner::new(config.clone()).connect().await?;
    let bus: Arc<dyn Bus> = Arc::new(bus);

    let interrupt = interrupt_on_ctrl_c();

    let options = ControlOptions {
        landing_after: Duration::from_secs(cli.landing_after),
        monitor_every: Duration::from_secs(cli.monitor_every),
    };
    run_controller(Arc::clone(&bus), config, options, interrupt).await?;

    bus.close().await?;
    info!("flight controller shut down");
    Ok(())
}
