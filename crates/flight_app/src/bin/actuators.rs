//! # actuators — Actuator simulator process
//!
//! Acknowledges every command from `flight_control.actuator.update` on
//! `flight_control.actuator.data` until the shutdown signal.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use flight_app::actors::run_actuators;
use flight_app::cli::{ActorArgs, init_tracing, interrupt_on_ctrl_c};
use flight_net::Bus;
use flight_system::ActorRunner;

/// Actuator simulator.
#[derive(Debug, Parser)]
#[command(name = "actuators", version, about)]
struct Cli {
    #[command(flatten)]
    actor: ActorArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("actuators")?;

    let config = cli.actor.config("actuators");
    let bus = ActorRunner::new(config.clone()).connect().await?;
    let bus: Arc<dyn Bus> = Arc::new(bus);

    let interrupt = interrupt_on_ctrl_c();

    run_actuators(Arc::clone(&bus), config, interrupt).await?;

    bus.close().await?;
    info!("actuators shut down");
    Ok(())
}
