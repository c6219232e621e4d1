//! All three actors in one process over a [`MemoryBus`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use flight_net::{Bus, MemoryBus};
use flight_sim::sensor::DEFAULT_PERIOD;
use flight_sim::{ActuatorReport, SensorReport};

use crate::actors::{run_actuators, run_sensors};
use crate::cli::ActorArgs;
use crate::control::{ControlOptions, ControlSummary, run_controller};

/// Timings and seeding for an in-process run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    /// Controller timings.
    pub control: ControlOptions,
    /// Sensor generation period.
    pub sensor_period: Duration,
    /// Seed for the sensor generator; a fresh OS seed when `None`.
    pub seed: Option<u64>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            control: ControlOptions::default(),
            sensor_period: DEFAULT_PERIOD,
            seed: None,
        }
    }
}

/// Every actor's report.
#[derive(Debug, Clone, Copy)]
pub struct SimulationSummary {
    /// The controller's summary.
    pub control: ControlSummary,
    /// The sensor simulator's totals.
    pub sensors: SensorReport,
    /// The actuator simulator's totals.
    pub actuators: ActuatorReport,
}

/// Run controller, sensors and actuators until touchdown or `interrupt`.
///
/// # Errors
///
/// Returns the first actor error, or an error if an actor task panicked.
pub async fn run_simulation(
    actor: &ActorArgs,
    options: SimulationOptions,
    interrupt: CancellationToken,
) -> Result<SimulationSummary> {
    let bus = Arc::new(MemoryBus::new());
    let shared: Arc<dyn Bus> = bus.clone();
    let stop = interrupt.child_token();
    let rng = options
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    info!(seed = ?options.seed, "simulation starting on the in-memory bus");

    let actuators = tokio::spawn(run_actuators(
        Arc::clone(&shared),
        actor.config("actuators"),
        stop.clone(),
    ));
    let sensors = tokio::spawn(run_sensors(
        Arc::clone(&shared),
        actor.config("sensors"),
        rng,
        options.sensor_period,
        stop.clone(),
    ));

    let control = run_controller(
        Arc::clone(&shared),
        actor.config("flight_control"),
        options.control,
        stop.clone(),
    )
    .await;
    if control.is_err() {
        stop.cancel();
    }

    let sensors = sensors.await?;
    let actuators = actuators.await?;
    bus.close().await?;

    let summary = SimulationSummary {
        control: control?,
        sensors: sensors?,
        actuators: actuators?,
    };
    info!(
        sensors = %summary.sensors,
        actuators = %summary.actuators,
        "simulation finished"
    );
    Ok(summary)
}
