//! Controller lifecycle.
//!
//! 1. Start the engine actor on `flight_control.*.data`.
//! 2. After the landing delay, signal both simulators to begin descent.
//! 3. Log the flight state on every monitor period.
//! 4. Once the engine reports touchdown (or the process is interrupted),
//!    drain and log the run summary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use flight_control::{DecisionEngine, EngineStats, FlightSnapshot};
use flight_net::{Bus, subjects};
use flight_system::{ActorConfig, ActorRunner, RunStats};

/// Default delay before the landing signal.
pub const DEFAULT_LANDING_AFTER: Duration = Duration::from_secs(30);

/// Default state monitor period.
pub const DEFAULT_MONITOR_EVERY: Duration = Duration::from_secs(5);

/// Controller timings.
#[derive(Debug, Clone, Copy)]
pub struct ControlOptions {
    /// Delay before the landing signal.
    pub landing_after: Duration,
    /// State monitor period.
    pub monitor_every: Duration,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            landing_after: DEFAULT_LANDING_AFTER,
            monitor_every: DEFAULT_MONITOR_EVERY,
        }
    }
}

/// What the controller reports when it stops.
#[derive(Debug, Clone, Copy)]
pub struct ControlSummary {
    /// Handler timings from the actor runtime.
    pub run: RunStats,
    /// Engine counters.
    pub engine: EngineStats,
    /// Flight state at shutdown.
    pub final_state: FlightSnapshot,
}

/// Run the decision engine on `bus` until the aircraft lands or `interrupt`
/// is cancelled. The bus is left open for the caller to close.
///
/// # Errors
///
/// Returns an error if the subscription cannot be created or a helper task
/// panicked.
pub async fn run_controller(
    bus: Arc<dyn Bus>,
    config: ActorConfig,
    options: ControlOptions,
    interrupt: CancellationToken,
) -> Result<ControlSummary> {
    let engine = Arc::new(DecisionEngine::new(Arc::clone(&bus)));
    let shutdown = engine.shutdown_token();

    // An interrupt stops the engine the same way touchdown does.
    let forward = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                () = interrupt.cancelled() => {
                    warn!("interrupted before touchdown");
                    shutdown.cancel();
                }
                () = shutdown.cancelled() => {}
            }
        }
    });
    let landing = tokio::spawn(schedule_landing(
        Arc::clone(&engine),
        options.landing_after,
        shutdown.clone(),
    ));
    let monitor = tokio::spawn(monitor(
        Arc::clone(&engine),
        options.monitor_every,
        shutdown.clone(),
    ));

    let runner = ActorRunner::new(config);
    let run = runner
        .run(bus, subjects::ALL_DATA, engine.clone(), shutdown.clone())
        .await;
    // The subscription may also have ended on its own.
    shutdown.cancel();
    forward.await?;
    landing.await?;
    monitor.await?;
    let run = run?;

    let summary = ControlSummary {
        run,
        engine: engine.stats(),
        final_state: engine.snapshot(),
    };
    let state = serde_json::to_string(&summary.final_state).unwrap_or_default();
    info!(
        handled = %summary.run,
        engine = %summary.engine,
        state,
        "flight control summary"
    );
    Ok(summary)
}

async fn schedule_landing(engine: Arc<DecisionEngine>, after: Duration, stop: CancellationToken) {
    tokio::select! {
        () = stop.cancelled() => {}
        () = tokio::time::sleep(after) => engine.initiate_landing().await,
    }
}

async fn monitor(engine: Arc<DecisionEngine>, every: Duration, stop: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;
    loop {
        tokio::select! {
            () = stop.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = engine.snapshot();
                match serde_json::to_string(&snapshot) {
                    Ok(line) => info!(state = %line, "flight state"),
                    Err(e) => warn!(error = %e, "failed to serialise flight state"),
                }
            }
        }
    }
}
