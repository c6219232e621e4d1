//! Simulator lifecycles.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use flight_net::{Bus, subjects};
use flight_sim::{ActuatorReport, ActuatorSimulator, SensorReport, SensorSimulator};
use flight_system::{ActorConfig, ActorRunner};

/// Stop `stop` when `interrupt` fires, until either is cancelled.
fn forward_interrupt(interrupt: CancellationToken, stop: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            () = interrupt.cancelled() => {
                warn!("interrupted before shutdown signal");
                stop.cancel();
            }
            () = stop.cancelled() => {}
        }
    });
}

/// Run the sensor simulator on `bus` until the shutdown signal arrives or
/// `interrupt` is cancelled.
///
/// # Errors
///
/// Returns an error if the subscription cannot be created or the generator
/// task panicked.
pub async fn run_sensors<R>(
    bus: Arc<dyn Bus>,
    config: ActorConfig,
    rng: R,
    period: Duration,
    interrupt: CancellationToken,
) -> Result<SensorReport>
where
    R: Rng + Send + 'static,
{
    let sim = Arc::new(SensorSimulator::new(Arc::clone(&bus), rng));
    let stop = sim.stop_token();
    forward_interrupt(interrupt, stop.clone());

    let generator = tokio::spawn({
        let sim = Arc::clone(&sim);
        async move { sim.run(period).await }
    });

    let runner = ActorRunner::new(config);
    let run = runner
        .run(bus, subjects::SENSOR_UPDATE, sim.clone(), stop.clone())
        .await;
    stop.cancel();
    let report = generator.await?;
    run?;

    info!(%report, "sensors summary");
    Ok(report)
}

/// Run the actuator simulator on `bus` until the shutdown signal arrives or
/// `interrupt` is cancelled.
///
/// # Errors
///
/// Returns an error if the subscription cannot be created.
pub async fn run_actuators(
    bus: Arc<dyn Bus>,
    config: ActorConfig,
    interrupt: CancellationToken,
) -> Result<ActuatorReport> {
    let sim = Arc::new(ActuatorSimulator::new(Arc::clone(&bus)));
    let stop = sim.stop_token();
    forward_interrupt(interrupt, stop.clone());

    let runner = ActorRunner::new(config);
    runner
        .run(bus, subjects::ACTUATOR_UPDATE, sim.clone(), stop.clone())
        .await?;
    stop.cancel();

    let report = sim.report();
    info!(%report, "actuators summary");
    Ok(report)
}
